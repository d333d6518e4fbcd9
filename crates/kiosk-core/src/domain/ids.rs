//! Opaque identifiers handed out by the compositor engine.
//!
//! The engine owns the real display, surface and device resources.  It tags
//! every object it tells us about with a numeric id, and the session keeps its
//! own state in maps keyed by those ids instead of holding pointers into engine
//! memory.  When the engine reports that an object is gone, the map entry is
//! removed and any later event carrying the stale id simply finds nothing.

use std::fmt;

/// Identifies one physical display (an engine output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputId(pub u64);

/// Identifies one client surface: the primary application surface or a layer surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

/// Identifies one hot-plugged input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub u64);

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "output#{}", self.0)
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device#{}", self.0)
    }
}
