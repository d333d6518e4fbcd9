//! Events delivered by the compositor engine.
//!
//! The engine reports everything that happens on the display server side as
//! one closed enum.  Global events (a new output, a new input device, cursor
//! motion, a new shell surface) are only delivered while the session holds a
//! listener for their [`EventKind`].  Per-object events (commit, map, unmap,
//! destroy, output removal, mode change) belong to an object the session
//! already knows about and are always delivered.

use crate::domain::ids::{DeviceId, OutputId, SurfaceId};
use crate::domain::layer::LayerSurfaceState;
use crate::domain::seat::InputDevice;

/// Role a new shell surface asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellRole {
    /// An application window.
    Toplevel,
    /// A transient popup (menus, tooltips).
    Popup,
    /// A layer-shell surface (panel, background, lock screen, notification).
    Layer {
        namespace: String,
        /// Output the client asked for; `None` means "pick one for me".
        requested_output: Option<OutputId>,
        state: LayerSurfaceState,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    OutputAttached {
        output: OutputId,
        name: String,
        width: u32,
        height: u32,
    },
    OutputRemoved {
        output: OutputId,
    },
    OutputModeChanged {
        output: OutputId,
        width: u32,
        height: u32,
    },
    InputDeviceAttached(InputDevice),
    InputDeviceRemoved {
        device: DeviceId,
    },
    /// The cursor moved to an absolute layout position.
    PointerMotion {
        x: f64,
        y: f64,
        time_msec: u32,
    },
    ShellSurfaceCreated {
        surface: SurfaceId,
        role: ShellRole,
    },
    /// The client committed new state.  Layer surfaces carry their pending state.
    SurfaceCommitted {
        surface: SurfaceId,
        layer_state: Option<LayerSurfaceState>,
    },
    SurfaceMapped {
        surface: SurfaceId,
    },
    SurfaceUnmapped {
        surface: SurfaceId,
    },
    SurfaceDestroyed {
        surface: SurfaceId,
    },
}

/// Global event sources the session subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NewOutput,
    NewInput,
    CursorMotion,
    NewXdgSurface,
    NewLayerSurface,
}

impl EngineEvent {
    /// Returns the listener this event requires, or `None` for per-object events.
    pub fn listener_kind(&self) -> Option<EventKind> {
        match self {
            EngineEvent::OutputAttached { .. } => Some(EventKind::NewOutput),
            EngineEvent::InputDeviceAttached(_) => Some(EventKind::NewInput),
            EngineEvent::PointerMotion { .. } => Some(EventKind::CursorMotion),
            EngineEvent::ShellSurfaceCreated {
                role: ShellRole::Layer { .. },
                ..
            } => Some(EventKind::NewLayerSurface),
            EngineEvent::ShellSurfaceCreated { .. } => Some(EventKind::NewXdgSurface),
            EngineEvent::OutputRemoved { .. }
            | EngineEvent::OutputModeChanged { .. }
            | EngineEvent::InputDeviceRemoved { .. }
            | EngineEvent::SurfaceCommitted { .. }
            | EngineEvent::SurfaceMapped { .. }
            | EngineEvent::SurfaceUnmapped { .. }
            | EngineEvent::SurfaceDestroyed { .. } => None,
        }
    }
}
