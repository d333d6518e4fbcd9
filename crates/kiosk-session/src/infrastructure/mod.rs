//! Infrastructure layer of the kiosk session.
//!
//! Contains the OS- and engine-facing adapters: the compositor engine
//! boundary, the child process supervisor, signal forwarding and the process
//! environment.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `kiosk_core`, but the domain crate MUST NOT depend on it.

pub mod engine;
pub mod environment;
pub mod signals;
pub mod supervisor;
