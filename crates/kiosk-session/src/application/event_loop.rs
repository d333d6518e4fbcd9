//! The single-threaded session event loop.
//!
//! Everything that can wake the session up funnels into one unbounded channel:
//!
//! ```text
//!  engine ──────────── SessionEvent::Engine(..) ─────┐
//!  SIGINT / SIGTERM ── SessionEvent::Terminate(..) ──┼──► EventLoop::run ──► handler
//!  child pipe hangup ─ SessionEvent::Terminate(..) ──┘
//! ```
//!
//! The loop hands engine events to the handler one at a time, each running to
//! completion, and returns as soon as the first termination request arrives.

use std::fmt;

use kiosk_core::EngineEvent;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Signals that end the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Interrupt,
    Terminate,
}

/// Why the loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationCause {
    /// SIGINT or SIGTERM was delivered to the session.
    Signal(TerminationSignal),
    /// The child's notification pipe was closed: the child exited (or failed to exec).
    ChildExited,
    /// The child's notification pipe reported an error.
    ChildPipeError,
    /// An unrecoverable runtime failure.
    Fatal(String),
}

impl TerminationCause {
    /// Returns `true` for causes that make the session exit with a failure status.
    pub fn is_failure(&self) -> bool {
        matches!(self, TerminationCause::Fatal(_))
    }
}

impl fmt::Display for TerminationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationCause::Signal(TerminationSignal::Interrupt) => write!(f, "SIGINT received"),
            TerminationCause::Signal(TerminationSignal::Terminate) => write!(f, "SIGTERM received"),
            TerminationCause::ChildExited => write!(f, "primary client closed its pipe"),
            TerminationCause::ChildPipeError => write!(f, "error on primary client pipe"),
            TerminationCause::Fatal(reason) => write!(f, "fatal: {reason}"),
        }
    }
}

/// Everything the loop can receive.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Engine(EngineEvent),
    Terminate(TerminationCause),
}

/// Producer half of the session channel.
pub type EventSender = UnboundedSender<SessionEvent>;

pub struct EventLoop {
    tx: EventSender,
    rx: UnboundedReceiver<SessionEvent>,
}

impl EventLoop {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// Returns a new producer handle for this loop.
    pub fn sender(&self) -> EventSender {
        self.tx.clone()
    }

    /// Dispatches engine events to `handler` until termination is requested.
    ///
    /// Engine events queued behind the termination request are not delivered.
    pub async fn run<F>(&mut self, mut handler: F) -> TerminationCause
    where
        F: FnMut(EngineEvent),
    {
        info!("session event loop running");
        loop {
            match self.rx.recv().await {
                Some(SessionEvent::Engine(event)) => {
                    debug!(?event, "engine event");
                    handler(event);
                }
                Some(SessionEvent::Terminate(cause)) => {
                    info!(%cause, "session termination requested");
                    return cause;
                }
                // Unreachable while `self.tx` is alive, kept for completeness.
                None => return TerminationCause::Fatal("event channel closed".into()),
            }
        }
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

/// A spawned task that is aborted when the guard is dropped.
#[derive(Debug)]
pub struct TaskGuard(JoinHandle<()>);

impl TaskGuard {
    pub fn spawn<F>(future: F) -> Self
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        Self(tokio::spawn(future))
    }

    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}
