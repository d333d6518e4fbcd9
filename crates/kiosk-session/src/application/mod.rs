//! Application layer of the kiosk session.
//!
//! # What is the "application" layer? (for beginners)
//!
//! The domain crate (`kiosk_core`) knows what outputs, layer surfaces and
//! seats *are*.  This layer decides *when* things happen to them:
//!
//! - **`config`**     – the validated [`config::SessionConfig`] every other
//!   component is built from.
//! - **`event_loop`** – the single-threaded loop and its channel.  Engine
//!   events, signals and the child's exit all arrive here.
//! - **`dispatch`**   – routes each engine event to the desktop model and the
//!   seat, and sends the resulting commands back to the engine.
//! - **`lifecycle`**  – brings a session up in a fixed order, runs it, and
//!   tears down exactly what was created, in reverse.

pub mod config;
pub mod dispatch;
pub mod event_loop;
pub mod lifecycle;
