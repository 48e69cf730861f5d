//! Wiring of the session core for one application load.
//!
//! SYSTEM CONTEXT
//! ==============
//! `App` builds one `SessionServices` and shares it through context. Every
//! consumer gets the same store, adapter, and bootstrapper handles; nothing
//! in the core is a global.

#[cfg(test)]
#[path = "services_test.rs"]
mod services_test;

use std::rc::Rc;

use super::bootstrap::SessionBootstrapper;
use super::session::SessionStore;
use crate::config::ClientConfig;
use crate::net::client::ApiClient;
use crate::net::transport::Transport;
use crate::util::navigation::{LocationNavigator, Navigator};
use crate::util::token_storage::{BrowserTokenStorage, TokenStorage};

#[derive(Clone)]
pub struct SessionServices {
    pub store: SessionStore,
    pub client: ApiClient,
    pub bootstrapper: SessionBootstrapper,
}

impl SessionServices {
    /// Assemble the core from explicit collaborators.
    #[must_use]
    pub fn new(storage: Rc<dyn TokenStorage>, navigator: Rc<dyn Navigator>, transport: Rc<dyn Transport>) -> Self {
        let store = SessionStore::new(storage, navigator);
        let client = ApiClient::new(transport, store.clone());
        let bootstrapper = SessionBootstrapper::new(client.clone());
        Self { store, client, bootstrapper }
    }

    /// Collaborators for the current environment: `localStorage`,
    /// `window.location`, and `fetch` when hydrated; inert stand-ins during
    /// server rendering.
    #[must_use]
    pub fn for_environment(config: &ClientConfig) -> Self {
        let storage = Rc::new(BrowserTokenStorage::new(config.storage_keys.clone()));
        let navigator = Rc::new(LocationNavigator::new(config.routes.clone()));
        Self::new(storage, navigator, environment_transport(config))
    }
}

#[cfg(feature = "hydrate")]
fn environment_transport(config: &ClientConfig) -> Rc<dyn Transport> {
    Rc::new(crate::net::transport::GlooTransport::new(config.api_base_url.clone()))
}

#[cfg(not(feature = "hydrate"))]
fn environment_transport(config: &ClientConfig) -> Rc<dyn Transport> {
    log::debug!("services: no HTTP stack for {}", config.api_base_url);
    Rc::new(crate::net::transport::DetachedTransport)
}
