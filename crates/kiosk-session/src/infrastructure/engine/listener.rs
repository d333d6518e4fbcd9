//! RAII listener registrations.
//!
//! An engine only delivers global events of a given [`EventKind`] while at
//! least one [`Listener`] for it is alive.  Dropping the listener unregisters
//! it immediately, so a session that tears down its listeners stops receiving
//! those events before anything else is destroyed.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use kiosk_core::EventKind;
use tracing::debug;

type Counts = RefCell<HashMap<EventKind, usize>>;

/// The registrations held by one engine.
#[derive(Debug, Clone, Default)]
pub struct ListenerSet {
    counts: Rc<Counts>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers interest in `kind`.  The registration lasts until the returned
    /// guard is dropped.
    pub fn register(&self, kind: EventKind) -> Listener {
        *self.counts.borrow_mut().entry(kind).or_insert(0) += 1;
        debug!(?kind, "listener registered");
        Listener {
            kind,
            counts: Rc::downgrade(&self.counts),
        }
    }

    /// Returns `true` while at least one listener for `kind` is alive.
    pub fn is_active(&self, kind: EventKind) -> bool {
        self.counts.borrow().get(&kind).is_some_and(|n| *n > 0)
    }

    /// Total number of live registrations.
    pub fn active_count(&self) -> usize {
        self.counts.borrow().values().sum()
    }
}

/// A live registration.  Unregisters on drop.
#[must_use = "dropping a Listener unregisters it immediately"]
#[derive(Debug)]
pub struct Listener {
    kind: EventKind,
    counts: Weak<Counts>,
}

impl Listener {
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        // The engine may already be gone; nothing to unregister then.
        let Some(counts) = self.counts.upgrade() else {
            return;
        };
        let mut counts = counts.borrow_mut();
        if let Some(n) = counts.get_mut(&self.kind) {
            *n = n.saturating_sub(1);
        }
        debug!(kind = ?self.kind, "listener unregistered");
    }
}
