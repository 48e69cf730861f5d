//! Networking modules for the REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `transport` moves raw requests, `client` adds bearer attachment and the
//! refresh-and-retry path, `api` names the endpoints, and `types` defines the
//! wire schema.

pub mod api;
pub mod client;
pub mod transport;
pub mod types;
