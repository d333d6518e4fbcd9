//! The seat: input devices, capabilities, cursor and focus.
//!
//! There is exactly one seat.  It collects the input devices the engine
//! hot-plugs and tells clients which kinds of input exist (the *capability
//! set*).  Only keyboards and pointers are supported; touch screens, switches
//! and tablets are accepted but ignored.
//!
//! Every device add recomputes and announces the capability set before
//! returning, so clients never observe a stale set.

use std::collections::BTreeMap;

use bitflags::bitflags;
use tracing::{debug, info};

use super::ids::{DeviceId, SurfaceId};
use crate::protocol::commands::{Command, CommandSink};

/// Default seat name announced to clients.
pub const DEFAULT_SEAT_NAME: &str = "seat0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Keyboard,
    Pointer,
    Touch,
    Switch,
    TabletTool,
    TabletPad,
}

/// A hot-plugged input device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDevice {
    pub id: DeviceId,
    pub name: String,
    pub kind: DeviceKind,
}

impl InputDevice {
    pub fn new(id: DeviceId, name: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
        }
    }
}

bitflags! {
    /// Kinds of input the seat offers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u32 {
        const POINTER = 1;
        const KEYBOARD = 2;
    }
}

/// Key repeat settings applied to every keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardRepeat {
    /// Repeats per second.
    pub rate: u32,
    /// Delay before the first repeat, in milliseconds.
    pub delay_ms: u32,
}

impl Default for KeyboardRepeat {
    fn default() -> Self {
        Self {
            rate: 25,
            delay_ms: 600,
        }
    }
}

/// What happened to a newly attached device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceOutcome {
    /// The device was added; carries the capability set now announced.
    Registered(Capabilities),
    /// The device kind is not handled.  Not an error.
    Unsupported(DeviceKind),
}

#[derive(Debug)]
pub struct Seat {
    name: String,
    repeat: KeyboardRepeat,
    keyboards: BTreeMap<DeviceId, InputDevice>,
    pointers: BTreeMap<DeviceId, InputDevice>,
    cursor: (f64, f64),
    pointer_focus: Option<SurfaceId>,
    keyboard_focus: Option<SurfaceId>,
}

impl Seat {
    pub fn new(name: impl Into<String>, repeat: KeyboardRepeat) -> Self {
        Self {
            name: name.into(),
            repeat,
            keyboards: BTreeMap::new(),
            pointers: BTreeMap::new(),
            cursor: (0.0, 0.0),
            pointer_focus: None,
            keyboard_focus: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ── Devices ───────────────────────────────────────────────────────────────

    /// Registers a hot-plugged device and announces the new capability set.
    pub fn on_device_added(
        &mut self,
        sink: &mut dyn CommandSink,
        device: InputDevice,
    ) -> DeviceOutcome {
        match device.kind {
            DeviceKind::Keyboard => {
                sink.submit(Command::ConfigureKeyboard {
                    device: device.id,
                    repeat: self.repeat,
                });
                info!(device = %device.id, name = %device.name, "keyboard attached");
                self.keyboards.insert(device.id, device);
            }
            DeviceKind::Pointer => {
                sink.submit(Command::AttachPointer { device: device.id });
                info!(device = %device.id, name = %device.name, "pointer attached");
                self.pointers.insert(device.id, device);
            }
            kind => {
                debug!(device = %device.id, name = %device.name, ?kind, "unsupported input device");
                return DeviceOutcome::Unsupported(kind);
            }
        }

        DeviceOutcome::Registered(self.announce(sink))
    }

    /// Forgets a device and announces the new capability set.
    ///
    /// Returns `false` if the device was never registered.
    pub fn on_device_removed(&mut self, sink: &mut dyn CommandSink, id: DeviceId) -> bool {
        let removed = self.keyboards.remove(&id).or_else(|| self.pointers.remove(&id));
        if removed.is_none() {
            return false;
        }
        self.announce(sink);
        true
    }

    /// The kinds of input currently available.
    pub fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::empty();
        if !self.pointers.is_empty() {
            caps |= Capabilities::POINTER;
        }
        if !self.keyboards.is_empty() {
            caps |= Capabilities::KEYBOARD;
        }
        caps
    }

    fn announce(&self, sink: &mut dyn CommandSink) -> Capabilities {
        let caps = self.capabilities();
        sink.submit(Command::SetCapabilities(caps));
        caps
    }

    pub fn device_count(&self) -> usize {
        self.keyboards.len() + self.pointers.len()
    }

    // ── Cursor and focus ──────────────────────────────────────────────────────

    pub fn cursor_position(&self) -> (f64, f64) {
        self.cursor
    }

    pub fn set_cursor_position(&mut self, x: f64, y: f64) {
        self.cursor = (x, y);
    }

    pub fn pointer_focus(&self) -> Option<SurfaceId> {
        self.pointer_focus
    }

    pub(crate) fn set_pointer_focus(&mut self, surface: Option<SurfaceId>) {
        self.pointer_focus = surface;
    }

    pub fn keyboard_focus(&self) -> Option<SurfaceId> {
        self.keyboard_focus
    }

    /// Moves keyboard focus, issuing a command only when it actually changes.
    pub fn set_keyboard_focus(&mut self, sink: &mut dyn CommandSink, surface: Option<SurfaceId>) {
        if self.keyboard_focus == surface {
            return;
        }
        self.keyboard_focus = surface;
        match surface {
            Some(surface) => sink.submit(Command::SetKeyboardFocus { surface }),
            None => sink.submit(Command::ClearKeyboardFocus),
        }
    }
}

impl Default for Seat {
    fn default() -> Self {
        Self::new(DEFAULT_SEAT_NAME, KeyboardRepeat::default())
    }
}
