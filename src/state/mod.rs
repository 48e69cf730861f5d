//! Session state and its lifecycle.
//!
//! DESIGN
//! ======
//! `session` holds the store and its pure transitions, `bootstrap` runs the
//! one-time restore, and `services` wires both to the HTTP adapter.

pub mod bootstrap;
pub mod services;
pub mod session;
