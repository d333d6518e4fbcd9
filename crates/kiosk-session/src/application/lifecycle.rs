//! Session lifecycle: startup, run, teardown.
//!
//! # Startup order
//!
//! ```text
//!  1. validate config and XDG_RUNTIME_DIR
//!  2. event channel + SIGINT/SIGTERM forwarders
//!  3. engine backend
//!  4. drop privileges
//!  5. compositor, output layout, data device manager  ── listen: new output
//!  6. XDG shell                                        ── listen: new toplevel/popup
//!  7. layer shell                                      ── listen: new layer surface
//!  8. seat + cursor                                    ── listen: new input, cursor motion
//!  9. display socket, backend start, WAYLAND_DISPLAY
//! 10. spawn the application, watch its pipe
//! 11. run until a termination request
//! ```
//!
//! Every resource lands in an `Option` slot of [`SessionContext`] as soon as it
//! exists.  Teardown walks the slots in reverse, so a failure at any step
//! releases exactly what was created before it.  The child, if one was
//! forked, is always reaped.

use std::ffi::OsString;

use kiosk_core::EventKind;
use nix::unistd::Pid;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::config::{ConfigError, SessionConfig};
use super::dispatch::Dispatcher;
use super::event_loop::{EventLoop, EventSender, TaskGuard, TerminationCause};
use crate::infrastructure::engine::{Engine, EngineError, Listener, Primitive};
use crate::infrastructure::environment::{self, EnvironmentError};
use crate::infrastructure::signals;
use crate::infrastructure::supervisor::privileges::{
    self, Credentials, PrivilegeDrop, PrivilegeError,
};
use crate::infrastructure::supervisor::{self, ChildExit, SpawnError};

/// Error that aborts a session before (or instead of) a clean run.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    #[error("unable to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Privileges(#[from] PrivilegeError),

    #[error("unable to start the application: {0}")]
    Spawn(#[from] SpawnError),
}

/// Outcome of [`run_session`].
#[derive(Debug)]
pub struct SessionReport {
    /// Why the loop stopped, or why the session never got that far.
    pub result: Result<TerminationCause, SessionError>,
    /// How the application ended, when one was started and reaped.
    pub child_exit: Option<ChildExit>,
}

impl SessionReport {
    /// Process exit status: 0 for a clean termination, whatever the
    /// application's own status was; 1 for any failure.
    pub fn exit_code(&self) -> u8 {
        match &self.result {
            Ok(cause) if !cause.is_failure() => 0,
            _ => 1,
        }
    }
}

/// Everything a session owns, filled in startup order.
struct SessionContext<E> {
    signal_tasks: Vec<TaskGuard>,
    engine: Option<E>,
    dispatcher: Option<Dispatcher>,
    listeners: Vec<Listener>,
    child: Option<Pid>,
    monitor_task: Option<TaskGuard>,
    loop_ran: bool,
}

impl<E: Engine> SessionContext<E> {
    fn new() -> Self {
        Self {
            signal_tasks: Vec::new(),
            engine: None,
            dispatcher: None,
            listeners: Vec::new(),
            child: None,
            monitor_task: None,
            loop_ran: false,
        }
    }

    /// Releases everything in reverse creation order.
    fn teardown(mut self) -> Option<ChildExit> {
        if self.loop_ran {
            if let Some(engine) = self.engine.as_mut() {
                engine.destroy_clients();
            }
        }

        let child_exit = self.child.take().and_then(|pid| match supervisor::reap(pid) {
            Ok(exit) => Some(exit),
            Err(e) => {
                error!("{e}");
                None
            }
        });

        self.monitor_task = None;
        self.signal_tasks.clear();
        while let Some(listener) = self.listeners.pop() {
            drop(listener);
        }
        self.dispatcher = None;
        if let Some(mut engine) = self.engine.take() {
            engine.destroy();
        }
        info!("session torn down");
        child_exit
    }
}

/// Runs one kiosk session around `command` and returns once it is over.
///
/// `create_backend` builds the engine; it receives the validated config and
/// the sender the engine must post its events to.
///
/// Must be called from within a Tokio runtime.
pub async fn run_session<E, F>(
    config: SessionConfig,
    command: Vec<OsString>,
    creds: &dyn Credentials,
    create_backend: F,
) -> SessionReport
where
    E: Engine,
    F: FnOnce(&SessionConfig, EventSender) -> Result<E, EngineError>,
{
    let mut ctx = SessionContext::new();
    let result = start_and_run(&mut ctx, config, &command, creds, create_backend).await;
    if let Err(e) = &result {
        error!("session failed: {e}");
    }
    let child_exit = ctx.teardown();
    SessionReport { result, child_exit }
}

async fn start_and_run<E, F>(
    ctx: &mut SessionContext<E>,
    config: SessionConfig,
    command: &[OsString],
    creds: &dyn Credentials,
    create_backend: F,
) -> Result<TerminationCause, SessionError>
where
    E: Engine,
    F: FnOnce(&SessionConfig, EventSender) -> Result<E, EngineError>,
{
    config.validate()?;
    environment::validate_runtime_dir(config.runtime_dir.as_deref())?;

    let mut event_loop = EventLoop::new();
    ctx.signal_tasks =
        signals::install_termination_handlers(event_loop.sender()).map_err(SessionError::Signals)?;

    let engine = ctx.engine.insert(create_backend(&config, event_loop.sender())?);

    if privileges::drop_privileges(creds)? == PrivilegeDrop::Unchanged {
        debug!("no elevated privileges to drop");
    }

    engine.create_primitive(Primitive::Compositor)?;
    engine.create_primitive(Primitive::OutputLayout)?;
    let dispatcher = ctx.dispatcher.insert(Dispatcher::new(config.repeat));
    engine.create_primitive(Primitive::DataDeviceManager)?;
    ctx.listeners.push(engine.listen(EventKind::NewOutput));

    engine.create_primitive(Primitive::XdgShell)?;
    ctx.listeners.push(engine.listen(EventKind::NewXdgSurface));
    engine.create_primitive(Primitive::LayerShell)?;
    ctx.listeners.push(engine.listen(EventKind::NewLayerSurface));

    engine.create_primitive(Primitive::Seat)?;
    engine.create_primitive(Primitive::Cursor)?;
    ctx.listeners.push(engine.listen(EventKind::NewInput));
    ctx.listeners.push(engine.listen(EventKind::CursorMotion));

    let socket_name = engine.add_socket_auto()?;
    engine.start()?;
    if let Err(e) = environment::export_display_name(&socket_name) {
        warn!("unable to set {}: {e}", environment::DISPLAY_VAR);
    }
    info!(display = %socket_name, "display ready");

    let client = match supervisor::spawn(command) {
        Ok(client) => client,
        Err(e) => {
            ctx.child = e.child_pid();
            return Err(e.into());
        }
    };
    ctx.child = Some(client.pid);
    info!(pid = %client.pid, "application started");
    ctx.monitor_task = Some(client.monitor.forward_to(event_loop.sender()));

    let cause = event_loop
        .run(|event| dispatcher.handle(&mut *engine, event))
        .await;
    ctx.loop_ran = true;
    Ok(cause)
}
