//! Dropping setuid/setgid privileges.
//!
//! A kiosk binary may be installed setuid so that it can open input and DRM
//! devices.  Once the backend holds those devices the session gives the
//! elevated ids up for good, before any client can connect:
//!
//! 1. real and effective ids equal: nothing to drop.
//! 2. otherwise set the gid, then the uid, to the real ids (gid first, because
//!    changing the gid needs the privileges that changing the uid gives up);
//! 3. then probe that the former effective ids can no longer be regained.  A
//!    platform that keeps a saved set-user-id around would pass step 2 and
//!    fail here.
//!
//! Any deviation is fatal: the session refuses to start.

use nix::unistd::{Gid, Uid};
use thiserror::Error;
use tracing::{error, info};

/// Access to the process credentials.
#[cfg_attr(test, mockall::automock)]
pub trait Credentials {
    fn real_uid(&self) -> Uid;
    fn effective_uid(&self) -> Uid;
    fn real_gid(&self) -> Gid;
    fn effective_gid(&self) -> Gid;
    fn set_uid(&self, uid: Uid) -> nix::Result<()>;
    fn set_gid(&self, gid: Gid) -> nix::Result<()>;
}

/// The real process credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCredentials;

impl Credentials for SystemCredentials {
    fn real_uid(&self) -> Uid {
        nix::unistd::getuid()
    }

    fn effective_uid(&self) -> Uid {
        nix::unistd::geteuid()
    }

    fn real_gid(&self) -> Gid {
        nix::unistd::getgid()
    }

    fn effective_gid(&self) -> Gid {
        nix::unistd::getegid()
    }

    fn set_uid(&self, uid: Uid) -> nix::Result<()> {
        nix::unistd::setuid(uid)
    }

    fn set_gid(&self, gid: Gid) -> nix::Result<()> {
        nix::unistd::setgid(gid)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrivilegeError {
    #[error("unable to drop group privileges to gid {gid}: {source}")]
    SetGid { gid: Gid, source: nix::errno::Errno },

    #[error("unable to drop user privileges to uid {uid}: {source}")]
    SetUid { uid: Uid, source: nix::errno::Errno },

    #[error("group privileges could be regained (gid {0}) after dropping them")]
    RegainedGid(Gid),

    #[error("user privileges could be regained (uid {0}) after dropping them")]
    RegainedUid(Uid),
}

/// What [`drop_privileges`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivilegeDrop {
    /// Real and effective ids were already equal.
    Unchanged,
    /// The process now runs as `uid`/`gid`.
    Dropped { uid: Uid, gid: Gid },
}

/// Drops elevated privileges permanently.
///
/// # Errors
///
/// Returns a [`PrivilegeError`] when the ids cannot be changed or the former
/// effective ids can still be regained afterwards.
pub fn drop_privileges(creds: &dyn Credentials) -> Result<PrivilegeDrop, PrivilegeError> {
    let (uid, euid) = (creds.real_uid(), creds.effective_uid());
    let (gid, egid) = (creds.real_gid(), creds.effective_gid());

    if uid == euid && gid == egid {
        return Ok(PrivilegeDrop::Unchanged);
    }

    creds.set_gid(gid).map_err(|source| {
        error!(%gid, "unable to drop root, refusing to start");
        PrivilegeError::SetGid { gid, source }
    })?;
    creds.set_uid(uid).map_err(|source| {
        error!(%uid, "unable to drop root, refusing to start");
        PrivilegeError::SetUid { uid, source }
    })?;

    if egid != gid && creds.set_gid(egid).is_ok() {
        error!(%egid, "former effective gid could be restored, refusing to start");
        return Err(PrivilegeError::RegainedGid(egid));
    }
    if euid != uid && creds.set_uid(euid).is_ok() {
        error!(%euid, "former effective uid could be restored, refusing to start");
        return Err(PrivilegeError::RegainedUid(euid));
    }

    info!(%uid, %gid, "privileges dropped");
    Ok(PrivilegeDrop::Dropped { uid, gid })
}
