//! One-shot session bootstrap for an application load.
//!
//! SYSTEM CONTEXT
//! ==============
//! The root component starts the bootstrapper once after mount. It restores
//! the session from persisted tokens and, when a token exists but no user is
//! known yet, resolves the identity through the authenticated adapter.
//!
//! ERROR HANDLING
//! ==============
//! A failed identity fetch never logs the visitor out here: the session stays
//! authenticated with an unknown identity. Only the HTTP adapter declares a
//! token dead, and it does so on its own when refresh is rejected.

#[cfg(test)]
#[path = "bootstrap_test.rs"]
mod bootstrap_test;

use std::cell::RefCell;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};

use super::session::{SessionPhase, SessionStore};
use crate::net::api;
use crate::net::client::ApiClient;

/// Where the session ended up after bootstrap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Anonymous,
    Authenticated,
    /// A token is held but the identity fetch failed.
    IdentityUnknown,
    /// The session changed (logout or login) while the identity was being
    /// fetched; the fetched identity was dropped.
    Discarded,
}

type SharedRun = Shared<LocalBoxFuture<'static, BootstrapOutcome>>;

/// Runs the bootstrap sequence at most once; concurrent and later callers
/// share the first run's outcome.
#[derive(Clone)]
pub struct SessionBootstrapper {
    client: ApiClient,
    run: Rc<RefCell<Option<SharedRun>>>,
}

impl SessionBootstrapper {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client, run: Rc::new(RefCell::new(None)) }
    }

    /// Restore the session and resolve the identity if needed.
    pub async fn run(&self) -> BootstrapOutcome {
        let existing = self.run.borrow().clone();
        let run = match existing {
            Some(run) => run,
            None => {
                let run = bootstrap(self.client.clone()).boxed_local().shared();
                *self.run.borrow_mut() = Some(run.clone());
                run
            }
        };
        run.await
    }
}

async fn bootstrap(client: ApiClient) -> BootstrapOutcome {
    let store: SessionStore = client.store().clone();
    store.initialize_auth();

    let outcome = match store.phase() {
        SessionPhase::Authenticated => BootstrapOutcome::Authenticated,
        SessionPhase::AuthenticatedNoUser => resolve_identity(&client, &store).await,
        SessionPhase::Uninitialized | SessionPhase::Loading | SessionPhase::Anonymous => BootstrapOutcome::Anonymous,
    };
    log::info!("bootstrap: {outcome:?}");
    outcome
}

async fn resolve_identity(client: &ApiClient, store: &SessionStore) -> BootstrapOutcome {
    let generation = store.generation();
    match api::fetch_current_user(client).await {
        Ok(user) => {
            if store.set_user_for(generation, user) {
                BootstrapOutcome::Authenticated
            } else {
                BootstrapOutcome::Discarded
            }
        }
        Err(e) => {
            if store.generation() != generation {
                return BootstrapOutcome::Discarded;
            }
            log::warn!("bootstrap: identity fetch failed: {e}");
            BootstrapOutcome::IdentityUnknown
        }
    }
}
