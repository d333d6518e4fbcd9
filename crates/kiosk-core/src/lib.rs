//! # kiosk-core
//!
//! Domain model of a single-application kiosk display session.
//!
//! This crate knows about displays, surfaces, input devices and focus, but not
//! about sockets, processes or any particular compositor engine.  It has zero
//! dependencies on OS APIs or async runtimes.
//!
//! # Architecture overview (for beginners)
//!
//! A kiosk session shows exactly one application full-screen on every
//! connected display.  A separate *compositor engine* does the heavy lifting
//! (rendering, buffers, the wire protocol) and reports what happens as
//! [`EngineEvent`]s.  The session decides what to do about each event and
//! answers with [`Command`]s.
//!
//! - **`domain`** – The decision making: output placement, the layer stack,
//!   hit testing, the seat and pointer focus.
//!
//! - **`protocol`** – The closed vocabulary of events and commands exchanged
//!   with the engine.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `kiosk_core::Desktop` instead of `kiosk_core::domain::desktop::Desktop`.
pub use domain::desktop::{Desktop, PrimaryView, SurfaceHit, SurfaceRef};
pub use domain::focus::{FocusRouter, MotionOutcome};
pub use domain::geometry::{Rect, Size};
pub use domain::ids::{DeviceId, OutputId, SurfaceId};
pub use domain::layer::{
    Anchor, LayerError, LayerStack, LayerSurface, LayerSurfaceState, Margin, Tier,
};
pub use domain::output::{LayoutError, Output, OutputLayout};
pub use domain::seat::{
    Capabilities, DeviceKind, DeviceOutcome, InputDevice, KeyboardRepeat, Seat,
};
pub use protocol::commands::{Command, CommandSink};
pub use protocol::events::{EngineEvent, EventKind, ShellRole};
