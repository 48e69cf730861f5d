//! Utility helpers shared across the session core and views.
//!
//! SYSTEM CONTEXT
//! ==============
//! Utility modules isolate browser concerns (storage, location) from the
//! session logic so it stays testable off-browser.

pub mod auth;
pub mod navigation;
pub mod token_storage;
