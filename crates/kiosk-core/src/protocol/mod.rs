//! The vocabulary spoken across the engine boundary.
//!
//! - **`events`** – what the engine tells the session ([`events::EngineEvent`]).
//! - **`commands`** – what the session asks the engine to do
//!   ([`commands::Command`]), pushed through a [`commands::CommandSink`].
//!
//! Both are closed enums.  Adding a new kind of event or command means every
//! `match` in the session has to handle it, which is exactly what we want.

pub mod commands;
pub mod events;
