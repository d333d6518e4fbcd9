//! Supervision of the one application process the kiosk exists to show.
//!
//! # How child exit is detected (for beginners)
//!
//! Before forking, the session opens a pipe.  The child keeps the **write**
//! end open (it is not close-on-exec in the child) and the
//! parent keeps only the **read** end.  Nothing is ever written to the pipe.
//! When the child process exits, for whatever reason, the kernel closes its
//! copy of the write end and the read end reports a hangup:
//!
//! ```text
//!   session (parent)                 application (child)
//!   read end ◄───────── pipe ──────── write end
//!       │                                 │
//!       │  hangup when the child exits ◄──┘
//!       ▼
//!   ChildMonitor ──► SessionEvent::Terminate ──► event loop stops ──► reap()
//! ```
//!
//! This avoids a `SIGCHLD` handler entirely and treats "exec failed" exactly
//! like "the application exited": the failed child calls `_exit(1)`, which
//! closes the pipe the same way.
//!
//! The submodule [`privileges`] drops setuid/setgid privileges before any
//! client can connect.

pub mod privileges;

use std::ffi::{CString, NulError, OsString};
use std::io;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::os::unix::ffi::OsStrExt;

use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, FdFlag, OFlag};
use nix::libc;
use nix::sys::signal::{sigprocmask, SigSet, SigmaskHow, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, pipe, ForkResult, Pid};
use thiserror::Error;
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;
use tracing::{debug, info, warn};

use crate::application::event_loop::{EventSender, SessionEvent, TaskGuard, TerminationCause};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failure to start the primary client.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("no application to run")]
    EmptyCommand,

    /// An argument contains an interior NUL byte and cannot be passed to exec.
    #[error("invalid application argument: {0}")]
    InvalidArgument(#[from] NulError),

    #[error("unable to create the child notification pipe: {0}")]
    Pipe(#[source] Errno),

    #[error("unable to fork: {0}")]
    Fork(#[source] Errno),

    /// The child exists but the parent could not finish setting up the pipe.
    #[error("unable to monitor child {pid}: {source}")]
    Setup {
        pid: Pid,
        #[source]
        source: io::Error,
    },
}

impl SpawnError {
    /// The pid of a child that was forked before the failure, if any.  Such a
    /// child still has to be reaped.
    pub fn child_pid(&self) -> Option<Pid> {
        match self {
            SpawnError::Setup { pid, .. } => Some(*pid),
            _ => None,
        }
    }
}

/// Failure to collect the child's exit status.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("waiting for child {pid} failed: {source}")]
    Wait {
        pid: Pid,
        #[source]
        source: Errno,
    },
}

// ── Types ─────────────────────────────────────────────────────────────────────

/// How the child's pipe ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hangup {
    /// The write end was closed: the child exited.
    Closed,
    /// The pipe reported an error condition.
    Error,
}

/// How the child terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    Exited(i32),
    Signaled(Signal),
}

/// Watches the read end of the child's notification pipe.
#[derive(Debug)]
pub struct ChildMonitor {
    fd: AsyncFd<OwnedFd>,
}

/// A running primary client.
#[derive(Debug)]
pub struct PrimaryClient {
    pub pid: Pid,
    pub monitor: ChildMonitor,
}

// ── Spawning ──────────────────────────────────────────────────────────────────

/// Forks and execs `argv` (looked up on `PATH`, no shell).
///
/// Must be called from within a Tokio runtime: the pipe's read end is
/// registered with the runtime's reactor.
///
/// # Errors
///
/// Errors raised after the fork carry the child's pid; see
/// [`SpawnError::child_pid`].
pub fn spawn(argv: &[OsString]) -> Result<PrimaryClient, SpawnError> {
    if argv.is_empty() {
        return Err(SpawnError::EmptyCommand);
    }

    // Everything the child touches is prepared before the fork; after it, the
    // child only makes async-signal-safe calls.
    let args = argv
        .iter()
        .map(|arg| CString::new(arg.as_bytes()))
        .collect::<Result<Vec<_>, _>>()?;
    let mut arg_ptrs: Vec<*const libc::c_char> = args.iter().map(|a| a.as_ptr()).collect();
    arg_ptrs.push(std::ptr::null());

    let (read_end, write_end) = pipe().map_err(SpawnError::Pipe)?;

    // SAFETY: the child branch below only calls async-signal-safe functions
    // (sigprocmask, close, execvp, _exit) before replacing or ending itself.
    match unsafe { fork() }.map_err(SpawnError::Fork)? {
        ForkResult::Child => {
            let _ = sigprocmask(SigmaskHow::SIG_SETMASK, Some(&SigSet::empty()), None);
            drop(read_end);
            // SAFETY: both pointers refer to NUL-terminated strings that
            // outlive the call, and the argument array is NULL-terminated.
            unsafe {
                libc::execvp(arg_ptrs[0], arg_ptrs.as_ptr());
                libc::_exit(1);
            }
        }
        ForkResult::Parent { child } => {
            debug!(pid = %child, "child process created");
            let monitor = finish_parent_setup(read_end, write_end)
                .map_err(|source| SpawnError::Setup { pid: child, source })?;
            Ok(PrimaryClient { pid: child, monitor })
        }
    }
}

fn finish_parent_setup(read_end: OwnedFd, write_end: OwnedFd) -> io::Result<ChildMonitor> {
    set_cloexec(read_end.as_raw_fd())?;
    set_cloexec(write_end.as_raw_fd())?;
    drop(write_end);

    let flags = OFlag::from_bits_truncate(fcntl(read_end.as_raw_fd(), FcntlArg::F_GETFL)?);
    fcntl(
        read_end.as_raw_fd(),
        FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK),
    )?;

    // SAFETY: the AsyncFd owns `read_end`, so the descriptor stays open and
    // refers to the same pipe until the monitor is dropped.
    let fd = unsafe { AsyncFd::register_with_interest(read_end, Interest::READABLE) }?;
    Ok(ChildMonitor { fd })
}

fn set_cloexec(fd: RawFd) -> nix::Result<()> {
    fcntl(fd, FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC)).map(drop)
}

// ── Monitoring ────────────────────────────────────────────────────────────────

impl ChildMonitor {
    /// Resolves once the pipe hangs up or fails.  Stray data is discarded.
    pub async fn wait_for_hangup(&self) -> Hangup {
        let mut buf = [0u8; 64];
        loop {
            let mut guard = match self.fd.readable().await {
                Ok(guard) => guard,
                Err(e) => {
                    warn!("polling the child pipe failed: {e}");
                    return Hangup::Error;
                }
            };
            if guard.ready().is_error() {
                return Hangup::Error;
            }
            let read = guard.try_io(|inner| {
                nix::unistd::read(inner.get_ref().as_raw_fd(), &mut buf).map_err(io::Error::from)
            });
            match read {
                Ok(Ok(0)) => return Hangup::Closed,
                Ok(Ok(n)) => debug!(bytes = n, "ignoring data on child pipe"),
                Ok(Err(e)) => {
                    warn!("reading the child pipe failed: {e}");
                    return Hangup::Error;
                }
                // Spurious wakeup; readiness was cleared, wait again.
                Err(_would_block) => {}
            }
        }
    }

    /// Spawns a task that waits for the hangup, closes the pipe and then asks
    /// the session to terminate.
    pub fn forward_to(self, events: EventSender) -> TaskGuard {
        TaskGuard::spawn(async move {
            let hangup = self.wait_for_hangup().await;
            drop(self);
            let cause = match hangup {
                Hangup::Closed => TerminationCause::ChildExited,
                Hangup::Error => TerminationCause::ChildPipeError,
            };
            info!(?hangup, "primary client pipe closed");
            if events.send(SessionEvent::Terminate(cause)).is_err() {
                debug!("session event loop gone before child exit was reported");
            }
        })
    }
}

// ── Reaping ───────────────────────────────────────────────────────────────────

/// Blocks until `pid` has terminated and classifies how.
pub fn reap(pid: Pid) -> Result<ChildExit, SupervisorError> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => {
                info!(%pid, code, "child exited normally");
                return Ok(ChildExit::Exited(code));
            }
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                info!(%pid, %signal, "child was terminated by a signal");
                return Ok(ChildExit::Signaled(signal));
            }
            Ok(status) => debug!(?status, "child has not terminated yet"),
            Err(Errno::EINTR) => {}
            Err(source) => return Err(SupervisorError::Wait { pid, source }),
        }
    }
}
