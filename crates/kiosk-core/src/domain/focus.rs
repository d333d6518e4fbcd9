//! Pointer focus routing.
//!
//! Each cursor motion is hit-tested against the [`Desktop`] and turned into at
//! most one pointer command:
//!
//! | Situation                                   | Command              |
//! |---------------------------------------------|----------------------|
//! | nothing under the cursor, focus existed     | `ClearPointerFocus`  |
//! | nothing under the cursor, no focus          | (none)               |
//! | a different surface than before             | `PointerEnter`       |
//! | the same surface, real motion (`time > 0`)  | `PointerMotion`      |
//! | the same surface, synthetic re-route        | (none)               |
//!
//! Enter and motion are never sent for the same event, and a surface never
//! receives motion before it has received an enter.

use tracing::debug;

use super::desktop::{Desktop, SurfaceRef};
use super::ids::SurfaceId;
use super::seat::Seat;
use crate::protocol::commands::{Command, CommandSink};

/// What a routed motion did to pointer focus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionOutcome {
    /// Focus moved to a new surface.
    Entered(SurfaceRef),
    /// Focus stayed; motion was delivered.
    Moved(SurfaceRef),
    /// Focus was dropped.
    Cleared,
    /// Nothing was sent.
    Unchanged,
}

/// Stateless router; focus itself lives in the [`Seat`].
pub struct FocusRouter;

impl FocusRouter {
    /// Moves the cursor to `(lx, ly)` and updates pointer focus.
    ///
    /// A `time_msec` of zero marks a synthetic re-route (after a hot-plug or
    /// surface change) which may change focus but never sends motion.
    pub fn route_motion(
        seat: &mut Seat,
        desktop: &Desktop,
        sink: &mut dyn CommandSink,
        lx: f64,
        ly: f64,
        time_msec: u32,
    ) -> MotionOutcome {
        seat.set_cursor_position(lx, ly);

        let Some(hit) = desktop.surface_at(lx, ly) else {
            if seat.pointer_focus().is_some() {
                seat.set_pointer_focus(None);
                sink.submit(Command::ClearPointerFocus);
                return MotionOutcome::Cleared;
            }
            return MotionOutcome::Unchanged;
        };

        let surface = hit.surface.id();
        if seat.pointer_focus() != Some(surface) {
            debug!(%surface, sx = hit.sx, sy = hit.sy, "pointer enter");
            seat.set_pointer_focus(Some(surface));
            sink.submit(Command::PointerEnter {
                surface,
                sx: hit.sx,
                sy: hit.sy,
            });
            return MotionOutcome::Entered(hit.surface);
        }

        if time_msec > 0 {
            sink.submit(Command::PointerMotion {
                time_msec,
                sx: hit.sx,
                sy: hit.sy,
            });
            return MotionOutcome::Moved(hit.surface);
        }
        MotionOutcome::Unchanged
    }

    /// Re-runs routing at the current cursor position with timestamp 0.
    pub fn refocus(seat: &mut Seat, desktop: &Desktop, sink: &mut dyn CommandSink) -> MotionOutcome {
        let (x, y) = seat.cursor_position();
        Self::route_motion(seat, desktop, sink, x, y, 0)
    }

    /// Drops pointer focus if it is on `surface`.
    ///
    /// Called when the surface goes away or is hidden, so the next motion over
    /// whatever is below starts with a fresh enter.
    pub fn forget_surface(seat: &mut Seat, sink: &mut dyn CommandSink, surface: SurfaceId) -> bool {
        if seat.pointer_focus() != Some(surface) {
            return false;
        }
        seat.set_pointer_focus(None);
        sink.submit(Command::ClearPointerFocus);
        true
    }
}
