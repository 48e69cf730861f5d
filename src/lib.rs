//! # matching-client
//!
//! Leptos + WASM frontend core for the seeker/provider matching service.
//!
//! This crate owns the client session: token persistence, the session store
//! and its bootstrap, the HTTP adapter with single-flight refresh-and-retry,
//! and the route guards that gate views on session state. Pages and
//! components are thin consumers of that core.

pub mod app;
pub mod components;
pub mod config;
pub mod error;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;

#[cfg(test)]
mod test_support;

/// Browser entry point: install logging and hydrate the server-rendered app.
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
    leptos::mount::hydrate_body(app::App);
}
