//! Domain entities of the kiosk session.
//!
//! Pure state and rules with no OS, engine or async dependencies.  Every
//! operation that needs the outside world to react pushes a
//! [`Command`](crate::protocol::commands::Command) into a
//! [`CommandSink`](crate::protocol::commands::CommandSink) instead of calling
//! anything directly, which keeps this layer testable with a plain `Vec`.
//!
//! # How the pieces fit (for beginners)
//!
//! - **`output`** – where each display sits in the shared coordinate space.
//! - **`layer`** – panels, wallpapers and overlays stacked in four tiers per
//!   display.
//! - **`desktop`** – outputs + layers + the one application surface, and the
//!   hit test that finds the surface under a point.
//! - **`seat`** – keyboards, pointers and the capability set.
//! - **`focus`** – turns cursor motion into pointer enter/motion/leave.

pub mod desktop;
pub mod focus;
pub mod geometry;
pub mod ids;
pub mod layer;
pub mod output;
pub mod seat;
