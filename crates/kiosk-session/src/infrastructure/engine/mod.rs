//! The compositor engine boundary.
//!
//! The engine renders, manages buffers and speaks the wire protocol.  The
//! session only sees it through the [`Engine`] trait:
//!
//! - **commands** go in through the [`CommandSink`] supertrait;
//! - **events** come out through the [`EventSender`] handed to the engine when
//!   it is created, but only for kinds the session is [`listen`](Engine::listen)ing to.
//!
//! # Implementations
//!
//! - **`headless`** – [`headless::HeadlessEngine`]: no display hardware.  It
//!   opens a real listening socket in the runtime directory and reports a fixed
//!   set of virtual outputs and input devices on start.
//! - **`mock`** – [`mock::RecordingEngine`]: records every call for assertions
//!   and can be told to fail at any startup step.
//!
//! [`EventSender`]: crate::application::event_loop::EventSender

use std::fmt;
use std::io;

use kiosk_core::{CommandSink, EventKind};
use thiserror::Error;

pub mod headless;
pub mod listener;
pub mod mock;

pub use listener::{Listener, ListenerSet};

/// Core objects the session asks the engine to create during startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Compositor,
    OutputLayout,
    DataDeviceManager,
    XdgShell,
    LayerShell,
    Seat,
    Cursor,
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Primitive::Compositor => "compositor",
            Primitive::OutputLayout => "output layout",
            Primitive::DataDeviceManager => "data device manager",
            Primitive::XdgShell => "XDG shell",
            Primitive::LayerShell => "layer shell",
            Primitive::Seat => "seat",
            Primitive::Cursor => "cursor",
        };
        f.write_str(name)
    }
}

/// Error type for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The backend could not be created.
    #[error("unable to create the backend: {0}")]
    Backend(String),

    /// A core primitive could not be created.
    #[error("unable to create the {0}")]
    Primitive(Primitive),

    /// No display socket could be opened.
    #[error("unable to open a display socket: {0}")]
    Socket(#[source] io::Error),

    /// Every candidate display name is taken.
    #[error("no free display socket name in {0}")]
    NoFreeSocket(String),

    /// The backend failed to start.
    #[error("unable to start the backend: {0}")]
    Start(String),
}

/// What the session needs from a compositor engine.
pub trait Engine: CommandSink {
    /// Creates one of the core objects.
    fn create_primitive(&mut self, primitive: Primitive) -> Result<(), EngineError>;

    /// Starts delivering global events of `kind` until the listener is dropped.
    fn listen(&mut self, kind: EventKind) -> Listener;

    /// Opens the client socket under the first free display name and returns
    /// that name (e.g. `wayland-0`).
    fn add_socket_auto(&mut self) -> Result<String, EngineError>;

    /// Starts the backend.  Outputs and input devices present at start are
    /// reported as events.
    fn start(&mut self) -> Result<(), EngineError>;

    /// Disconnects every client.
    fn destroy_clients(&mut self);

    /// Releases the display and everything it owns.
    fn destroy(&mut self);
}
