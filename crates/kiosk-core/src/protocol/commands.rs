//! Commands issued by the session to the compositor engine.

use crate::domain::geometry::Rect;
use crate::domain::ids::{DeviceId, OutputId, SurfaceId};
use crate::domain::seat::{Capabilities, KeyboardRepeat};

/// One request to the engine.
///
/// The domain never talks to the engine directly.  Operations that need the
/// engine to do something push a `Command` into a [`CommandSink`]; the session
/// forwards it to the real engine, while tests collect it in a `Vec`.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Place an output at a position in the engine's output layout.
    AddToLayout { output: OutputId, x: i32, y: i32 },
    /// Take an output out of the engine's output layout.
    RemoveFromLayout { output: OutputId },
    /// Give pointer focus to a surface at surface-local coordinates.
    PointerEnter { surface: SurfaceId, sx: f64, sy: f64 },
    /// Pointer moved within the focused surface.
    PointerMotion { time_msec: u32, sx: f64, sy: f64 },
    /// No surface under the cursor any more.
    ClearPointerFocus,
    SetKeyboardFocus { surface: SurfaceId },
    ClearKeyboardFocus,
    /// Repaint `region` (output-local) on `output`.
    ///
    /// `full` means geometry changed and the region must be redrawn as a whole;
    /// otherwise only surface content changed.
    Damage {
        output: OutputId,
        region: Rect,
        full: bool,
    },
    /// Ask the client to close the surface.
    CloseSurface { surface: SurfaceId },
    /// The surface is now visible on the output.
    SurfaceEnterOutput { surface: SurfaceId, output: OutputId },
    /// Tell the client the size it must use.
    ConfigureSurface {
        surface: SurfaceId,
        width: u32,
        height: u32,
    },
    /// Announce the seat capabilities to clients.
    SetCapabilities(Capabilities),
    ConfigureKeyboard {
        device: DeviceId,
        repeat: KeyboardRepeat,
    },
    /// Attach a pointer device to the cursor.
    AttachPointer { device: DeviceId },
}

/// Something that accepts engine commands.
pub trait CommandSink {
    fn submit(&mut self, command: Command);
}

impl CommandSink for Vec<Command> {
    fn submit(&mut self, command: Command) {
        self.push(command);
    }
}
