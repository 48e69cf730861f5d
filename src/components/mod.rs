//! Reusable UI component modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components read the mirrored session signal from Leptos context; none of
//! them mutate the session directly.

pub mod route_guard;
