//! Session-aware HTTP client for the protected API surface.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every protected call goes through `ApiClient::send`, which attaches the
//! current bearer token and owns the only recovery path for an expired one:
//! refresh once, retry once, otherwise end the session. Views never refresh
//! tokens or log out on their own.
//!
//! DESIGN
//! ======
//! Refresh is single-flight. The first request to see a `401` installs a
//! shared future in `refresh_slot`; requests that fail while it is pending
//! await that same future and retry with the token it produced. The refresh
//! future clears the slot itself when it completes, before any waiter
//! resumes, and a forced logout happens inside it so a rejected refresh
//! token ends the session exactly once no matter how many requests were
//! waiting.
//!
//! The slot is tagged with the session generation it was started under. A
//! refresh still pending from before a logout and re-login is never joined
//! by the new session, and cannot clear the new session's slot.
//!
//! ERROR HANDLING
//! ==============
//! Non-auth failures pass through unchanged. When refresh fails, callers get
//! the original `401` error (or the network error that prevented refresh)
//! and must not retry.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use std::cell::RefCell;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};

use super::transport::{ApiRequest, ApiResponse, Transport};
use super::types::{RefreshRequest, RefreshResponse};
use crate::error::ApiError;
use crate::state::session::SessionStore;
use crate::util::navigation::AuthReason;

pub const REFRESH_PATH: &str = "/auth/login/refresh/";

/// Why a refresh attempt produced no token.
#[derive(Clone, Debug, PartialEq)]
pub enum RefreshFailure {
    /// The refresh token is missing or was refused; the session was ended.
    Rejected,
    /// The refresh endpoint could not be reached or answered garbage; the
    /// session is unchanged.
    Unavailable(ApiError),
    /// The session changed while refreshing (logout or re-login).
    Superseded,
}

type SharedRefresh = Shared<LocalBoxFuture<'static, Result<String, RefreshFailure>>>;

/// The in-flight refresh and the session generation that started it.
struct PendingRefresh {
    generation: u64,
    refresh: SharedRefresh,
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Rc<dyn Transport>,
    store: SessionStore,
    refresh_slot: Rc<RefCell<Option<PendingRefresh>>>,
}

impl ApiClient {
    #[must_use]
    pub fn new(transport: Rc<dyn Transport>, store: SessionStore) -> Self {
        Self { transport, store, refresh_slot: Rc::new(RefCell::new(None)) }
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Send a request without credentials and without the refresh path.
    ///
    /// Used for login and registration, where a `401` means bad credentials.
    ///
    /// # Errors
    ///
    /// Returns the transport error or the classified non-2xx response.
    pub async fn send_anonymous(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let request = request.with_bearer(None);
        self.transport.send(&request).await?.into_result()
    }

    /// Send a request as the current session, recovering from one expired
    /// access token.
    ///
    /// # Errors
    ///
    /// Returns the transport error, the classified non-2xx response, or the
    /// original `401` when the session could not be refreshed.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let token = self.store.access_token();
        let response = self.transport.send(&request.clone().with_bearer(token.as_deref())).await?;
        if !response.is_unauthorized() || token.is_none() {
            return response.into_result();
        }
        let original = ApiError::from_response(response.status, &response.body);

        match self.fresh_token(token.as_deref()).await {
            Ok(fresh) => {
                log::debug!("api: retrying {} {} with refreshed token", request.method.as_str(), request.path);
                self.transport.send(&request.with_bearer(Some(&fresh))).await?.into_result()
            }
            Err(RefreshFailure::Unavailable(err)) => Err(err),
            Err(RefreshFailure::Rejected | RefreshFailure::Superseded) => Err(original),
        }
    }

    /// Token to retry with after `stale` was refused.
    async fn fresh_token(&self, stale: Option<&str>) -> Result<String, RefreshFailure> {
        if !self.store.is_authenticated() {
            return Err(RefreshFailure::Superseded);
        }
        let generation = self.store.generation();
        let pending = self.pending_refresh(generation);
        // A refresh that finished while this request was in flight already
        // replaced the token it used.
        if let Some(current) = self.store.access_token() {
            if Some(current.as_str()) != stale && pending.is_none() {
                return Ok(current);
            }
        }
        let refresh = match pending {
            Some(refresh) => refresh,
            None => {
                let refresh = self.start_refresh(generation);
                *self.refresh_slot.borrow_mut() = Some(PendingRefresh { generation, refresh: refresh.clone() });
                refresh
            }
        };
        refresh.await
    }

    /// The in-flight refresh started under `generation`, if any.
    fn pending_refresh(&self, generation: u64) -> Option<SharedRefresh> {
        self.refresh_slot
            .borrow()
            .as_ref()
            .filter(|pending| pending.generation == generation)
            .map(|pending| pending.refresh.clone())
    }

    fn start_refresh(&self, generation: u64) -> SharedRefresh {
        let transport = self.transport.clone();
        let store = self.store.clone();
        let slot = self.refresh_slot.clone();
        async move {
            let result = refresh_session(transport.as_ref(), &store, generation).await;
            let mut current = slot.borrow_mut();
            if current.as_ref().is_some_and(|pending| pending.generation == generation) {
                current.take();
            }
            result
        }
        .boxed_local()
        .shared()
    }
}

/// One refresh exchange, applied to the store.
async fn refresh_session(
    transport: &dyn Transport,
    store: &SessionStore,
    generation: u64,
) -> Result<String, RefreshFailure> {
    if store.generation() != generation {
        return Err(RefreshFailure::Superseded);
    }
    let Some(refresh) = store.refresh_token() else {
        store.logout(AuthReason::SessionExpired);
        return Err(RefreshFailure::Rejected);
    };
    let request = ApiRequest::post(REFRESH_PATH)
        .with_json(&RefreshRequest { refresh })
        .map_err(RefreshFailure::Unavailable)?;

    let response = match transport.send(&request).await {
        Ok(response) => response,
        Err(e) => {
            log::warn!("api: refresh endpoint unreachable: {e}");
            return Err(RefreshFailure::Unavailable(e));
        }
    };
    if store.generation() != generation {
        return Err(RefreshFailure::Superseded);
    }
    if !response.is_success() {
        log::warn!("api: refresh rejected with status {}", response.status);
        store.logout(AuthReason::SessionExpired);
        return Err(RefreshFailure::Rejected);
    }
    let body: RefreshResponse = response.json().map_err(RefreshFailure::Unavailable)?;
    if !store.apply_refreshed_tokens(generation, body.access.clone(), body.refresh) {
        return Err(RefreshFailure::Superseded);
    }
    log::debug!("api: access token refreshed");
    Ok(body.access)
}
