//! Headless engine: a display server without display hardware.
//!
//! Useful for running a kiosk session in CI or inside a container.  It does not
//! render anything, but it does everything the session can observe:
//!
//! - opens a real Unix listening socket `$XDG_RUNTIME_DIR/wayland-N`, guarded by
//!   a `wayland-N.lock` file, and accepts clients on it;
//! - reports one virtual output per configured mode plus a virtual keyboard and
//!   pointer when started;
//! - logs every command it receives.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use kiosk_core::{
    Command, CommandSink, DeviceId, DeviceKind, EngineEvent, EventKind, InputDevice, OutputId,
};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, info, warn};

use super::{Engine, EngineError, Listener, ListenerSet, Primitive};
use crate::application::config::{OutputMode, SessionConfig};
use crate::application::event_loop::{EventSender, SessionEvent, TaskGuard};

/// Highest display number tried by [`Engine::add_socket_auto`] (exclusive).
const MAX_DISPLAY_NUMBER: u32 = 32;

/// Owns the socket and lock files; removes both when dropped.
#[derive(Debug)]
struct SocketGuard {
    socket: PathBuf,
    lock: PathBuf,
    _lock_file: File,
}

impl Drop for SocketGuard {
    fn drop(&mut self) {
        for path in [&self.socket, &self.lock] {
            if let Err(e) = fs::remove_file(path) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(path = %path.display(), "failed to remove display socket file: {e}");
                }
            }
        }
    }
}

type Clients = Arc<Mutex<Vec<UnixStream>>>;

pub struct HeadlessEngine {
    runtime_dir: PathBuf,
    modes: Vec<OutputMode>,
    events: EventSender,
    listeners: ListenerSet,
    primitives: Vec<Primitive>,
    socket: Option<SocketGuard>,
    pending_listener: Option<UnixListener>,
    clients: Clients,
    accept_task: Option<TaskGuard>,
    started: bool,
}

impl HeadlessEngine {
    /// Creates a headless backend for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Backend`] if the configuration has no runtime
    /// directory to put the display socket in.
    pub fn new(config: &SessionConfig, events: EventSender) -> Result<Self, EngineError> {
        let runtime_dir = config
            .runtime_dir
            .clone()
            .ok_or_else(|| EngineError::Backend("no runtime directory configured".into()))?;
        info!(outputs = config.outputs.len(), "headless backend created");
        Ok(Self {
            runtime_dir,
            modes: config.outputs.clone(),
            events,
            listeners: ListenerSet::new(),
            primitives: Vec::new(),
            socket: None,
            pending_listener: None,
            clients: Arc::new(Mutex::new(Vec::new())),
            accept_task: None,
            started: false,
        })
    }

    /// Path of the listening socket, once opened.
    pub fn socket_path(&self) -> Option<&Path> {
        self.socket.as_ref().map(|s| s.socket.as_path())
    }

    /// Number of currently connected clients.
    pub fn client_count(&self) -> usize {
        lock_clients(&self.clients).len()
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Posts an event, honouring listener registrations for global events.
    fn post(&self, event: EngineEvent) {
        if let Some(kind) = event.listener_kind() {
            if !self.listeners.is_active(kind) {
                debug!(?kind, "no listener, event dropped");
                return;
            }
        }
        if self.events.send(SessionEvent::Engine(event)).is_err() {
            debug!("session event loop gone, event dropped");
        }
    }
}

fn lock_clients(clients: &Clients) -> MutexGuard<'_, Vec<UnixStream>> {
    clients.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn accept_clients(listener: UnixListener, clients: Clients) {
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let mut clients = lock_clients(&clients);
                clients.push(stream);
                debug!(connected = clients.len(), "client connected");
            }
            Err(e) => {
                warn!("accepting display clients failed: {e}");
                return;
            }
        }
    }
}

impl CommandSink for HeadlessEngine {
    fn submit(&mut self, command: Command) {
        debug!(?command, "headless engine command");
    }
}

impl Engine for HeadlessEngine {
    fn create_primitive(&mut self, primitive: Primitive) -> Result<(), EngineError> {
        if self.primitives.contains(&primitive) {
            return Err(EngineError::Primitive(primitive));
        }
        debug!(%primitive, "primitive created");
        self.primitives.push(primitive);
        Ok(())
    }

    fn listen(&mut self, kind: EventKind) -> Listener {
        self.listeners.register(kind)
    }

    fn add_socket_auto(&mut self) -> Result<String, EngineError> {
        for n in 0..MAX_DISPLAY_NUMBER {
            let name = format!("wayland-{n}");
            let socket = self.runtime_dir.join(&name);
            let lock = self.runtime_dir.join(format!("{name}.lock"));

            let lock_file = match OpenOptions::new().write(true).create_new(true).open(&lock) {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(EngineError::Socket(e)),
            };
            // Holding the lock makes any socket left at this path stale.
            if let Err(e) = fs::remove_file(&socket) {
                if e.kind() != io::ErrorKind::NotFound {
                    return Err(EngineError::Socket(e));
                }
            }
            let guard = SocketGuard {
                socket: socket.clone(),
                lock,
                _lock_file: lock_file,
            };

            let std_listener =
                std::os::unix::net::UnixListener::bind(&socket).map_err(EngineError::Socket)?;
            std_listener.set_nonblocking(true).map_err(EngineError::Socket)?;
            let listener = UnixListener::from_std(std_listener).map_err(EngineError::Socket)?;

            self.pending_listener = Some(listener);
            self.socket = Some(guard);
            info!(display = %name, path = %socket.display(), "display socket opened");
            return Ok(name);
        }
        Err(EngineError::NoFreeSocket(self.runtime_dir.display().to_string()))
    }

    fn start(&mut self) -> Result<(), EngineError> {
        if self.started {
            return Err(EngineError::Start("backend already started".into()));
        }
        self.started = true;

        if let Some(listener) = self.pending_listener.take() {
            let clients = Arc::clone(&self.clients);
            self.accept_task = Some(TaskGuard::spawn(accept_clients(listener, clients)));
        }

        for (i, mode) in self.modes.iter().enumerate() {
            let n = i as u64 + 1;
            self.post(EngineEvent::OutputAttached {
                output: OutputId(n),
                name: format!("HEADLESS-{n}"),
                width: mode.width,
                height: mode.height,
            });
        }
        self.post(EngineEvent::InputDeviceAttached(InputDevice::new(
            DeviceId(1),
            "headless-keyboard",
            DeviceKind::Keyboard,
        )));
        self.post(EngineEvent::InputDeviceAttached(InputDevice::new(
            DeviceId(2),
            "headless-pointer",
            DeviceKind::Pointer,
        )));
        info!("headless backend started");
        Ok(())
    }

    fn destroy_clients(&mut self) {
        let drained: Vec<UnixStream> = lock_clients(&self.clients).drain(..).collect();
        info!(count = drained.len(), "disconnecting display clients");
    }

    fn destroy(&mut self) {
        self.accept_task = None;
        self.pending_listener = None;
        lock_clients(&self.clients).clear();
        if self.socket.take().is_some() {
            debug!("display socket removed");
        }
        self.primitives.clear();
        info!("headless display destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    use crate::application::event_loop::{EventLoop, TerminationCause};

    fn make_engine(dir: &Path, modes: &[(u32, u32)]) -> (HeadlessEngine, EventLoop) {
        let event_loop = EventLoop::new();
        let config = SessionConfig {
            runtime_dir: Some(dir.to_path_buf()),
            outputs: modes
                .iter()
                .map(|&(width, height)| OutputMode { width, height })
                .collect(),
            ..SessionConfig::default()
        };
        let engine = HeadlessEngine::new(&config, event_loop.sender()).unwrap();
        (engine, event_loop)
    }

    #[test]
    fn test_new_requires_runtime_dir() {
        let event_loop = EventLoop::new();
        let result = HeadlessEngine::new(&SessionConfig::default(), event_loop.sender());
        assert!(matches!(result, Err(EngineError::Backend(_))));
    }

    #[test]
    fn test_create_primitive_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (mut engine, _loop) = make_engine(dir.path(), &[(800, 600)]);

        engine.create_primitive(Primitive::Compositor).unwrap();
        let second = engine.create_primitive(Primitive::Compositor);

        assert!(matches!(second, Err(EngineError::Primitive(Primitive::Compositor))));
    }

    #[tokio::test]
    async fn test_add_socket_auto_picks_first_free_name_and_cleans_up() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let (mut first, _l1) = make_engine(dir.path(), &[(800, 600)]);
        let (mut second, _l2) = make_engine(dir.path(), &[(800, 600)]);

        // Act
        let a = first.add_socket_auto().unwrap();
        let b = second.add_socket_auto().unwrap();

        // Assert
        assert_eq!(a, "wayland-0");
        assert_eq!(b, "wayland-1");
        assert!(dir.path().join("wayland-0").exists());
        assert!(dir.path().join("wayland-0.lock").exists());

        first.destroy();
        assert!(!dir.path().join("wayland-0").exists());
        assert!(!dir.path().join("wayland-0.lock").exists());
        assert!(dir.path().join("wayland-1").exists());
    }

    #[tokio::test]
    async fn test_start_reports_outputs_and_devices_only_to_listeners() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let (mut engine, mut event_loop) = make_engine(dir.path(), &[(1920, 1080), (1280, 720)]);
        let _outputs = engine.listen(EventKind::NewOutput);

        // Act
        engine.start().unwrap();

        // Assert
        let mut seen = Vec::new();
        let tx = event_loop.sender();
        tx.send(SessionEvent::Terminate(TerminationCause::ChildExited)).unwrap();
        event_loop.run(|event| seen.push(event)).await;
        assert_eq!(seen.len(), 2, "input devices are not reported without a listener");
        assert!(matches!(
            &seen[1],
            EngineEvent::OutputAttached { output: OutputId(2), width: 1280, height: 720, .. }
        ));
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (mut engine, _loop) = make_engine(dir.path(), &[(800, 600)]);
        engine.start().unwrap();
        assert!(matches!(engine.start(), Err(EngineError::Start(_))));
    }

    #[tokio::test]
    async fn test_destroy_clients_disconnects_connected_client() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let (mut engine, _loop) = make_engine(dir.path(), &[(800, 600)]);
        engine.add_socket_auto().unwrap();
        engine.start().unwrap();
        let path = engine.socket_path().unwrap().to_path_buf();
        let mut client = UnixStream::connect(&path).await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while engine.client_count() == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("client must be accepted");

        // Act
        engine.destroy_clients();

        // Assert
        assert_eq!(engine.client_count(), 0);
        let mut buf = [0u8; 8];
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(n, 0, "server side of the connection must be closed");
    }
}
