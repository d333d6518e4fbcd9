//! SIGINT/SIGTERM forwarding.
//!
//! Both signals mean the same thing: stop the session cleanly.  Each one gets a
//! small task that turns every delivery into a
//! [`SessionEvent::Terminate`] on the session channel.

use std::io;

use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

use crate::application::event_loop::{
    EventSender, SessionEvent, TaskGuard, TerminationCause, TerminationSignal,
};

/// Installs the handlers.  Dropping the returned guards stops forwarding.
///
/// # Errors
///
/// Fails if a signal handler cannot be registered with the runtime.
pub fn install_termination_handlers(events: EventSender) -> io::Result<Vec<TaskGuard>> {
    let mut guards = Vec::with_capacity(2);
    for (kind, which) in [
        (SignalKind::interrupt(), TerminationSignal::Interrupt),
        (SignalKind::terminate(), TerminationSignal::Terminate),
    ] {
        let mut stream = signal(kind)?;
        let events = events.clone();
        guards.push(TaskGuard::spawn(async move {
            while stream.recv().await.is_some() {
                info!(signal = ?which, "termination signal received");
                let cause = TerminationCause::Signal(which);
                if events.send(SessionEvent::Terminate(cause)).is_err() {
                    break;
                }
            }
        }));
    }
    Ok(guards)
}
