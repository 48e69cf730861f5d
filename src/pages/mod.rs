//! Page modules for route-level screens.
//!
//! ARCHITECTURE
//! ============
//! Each page owns route-scoped orchestration; session gating is done by the
//! guard components it is mounted under, never by the page itself.

pub mod dashboard;
pub mod login;
pub mod signup;
