//! Session state for the current browser visitor.
//!
//! SYSTEM CONTEXT
//! ==============
//! `SessionStore` is the single authority on whether the visitor is
//! authenticated. Route guards read snapshots of it, the bootstrapper and the
//! HTTP adapter mutate it, and it is the only component that writes token
//! persistence.
//!
//! DESIGN
//! ======
//! Transitions are computed by the pure `reduce` function, which returns the
//! next `Session` plus a `TokenSync` describing the storage writes it implies
//! and an optional `NavigationIntent`. The store applies them in a fixed
//! order: storage, in-memory state, listeners, navigation. A listener or
//! navigator that re-enters the store therefore always observes a fully
//! applied session.
//!
//! Every login and logout bumps `generation`. Async results (identity fetch,
//! token refresh) carry the generation they started under and are dropped if
//! the session has moved on, so a late response never resurrects a user or a
//! token after logout.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::SessionError;
use crate::net::types::User;
use crate::util::navigation::{AuthReason, NavigationIntent, Navigator};
use crate::util::token_storage::{TokenKind, TokenStorage};

/// Snapshot of the visitor's authentication state.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Resolved identity; only ever set while authenticated.
    pub user: Option<User>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// True iff a non-empty access token is held (not necessarily valid).
    pub is_authenticated: bool,
    /// True until persisted tokens have been read once.
    pub is_loading: bool,
    /// Why the session was last reset, for the entry view's banner.
    pub last_reason: Option<AuthReason>,
    /// Bumped on every login and logout.
    pub generation: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            user: None,
            access_token: None,
            refresh_token: None,
            is_authenticated: false,
            is_loading: true,
            last_reason: None,
            generation: 0,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |token: &Option<String>| token.as_ref().map(|_| "<redacted>");
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("is_authenticated", &self.is_authenticated)
            .field("is_loading", &self.is_loading)
            .field("last_reason", &self.last_reason)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Lifecycle position derived from a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// Store created, `initialize_auth` not yet called.
    Uninitialized,
    Loading,
    Anonymous,
    /// Token held, identity not (yet) resolved.
    AuthenticatedNoUser,
    Authenticated,
}

impl Session {
    /// Phase as seen from the snapshot alone; `Uninitialized` is only
    /// distinguishable by the store.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.is_loading {
            SessionPhase::Loading
        } else if !self.is_authenticated {
            SessionPhase::Anonymous
        } else if self.user.is_none() {
            SessionPhase::AuthenticatedNoUser
        } else {
            SessionPhase::Authenticated
        }
    }

    /// No identity, no tokens, bootstrap finished.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        !self.is_loading
            && !self.is_authenticated
            && self.user.is_none()
            && self.access_token.is_none()
            && self.refresh_token.is_none()
    }

    fn anonymous(generation: u64, reason: AuthReason) -> Self {
        Self { is_loading: false, last_reason: Some(reason), generation, ..Self::default() }
    }
}

// =============================================================================
// TRANSITIONS
// =============================================================================

/// Inputs to `reduce`.
#[derive(Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Tokens read from persistence at startup.
    Restore { access: Option<String>, refresh: Option<String> },
    Login { user: User, access: String, refresh: String },
    Logout { reason: AuthReason },
    /// Identity resolved under `generation`.
    SetUser { user: User, generation: u64 },
    /// Refresh endpoint answered under `generation`; `refresh` is set on rotation.
    TokensRefreshed { access: String, refresh: Option<String>, generation: u64 },
}

/// Storage writes implied by a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenSync {
    Keep,
    /// Write both entries; a `None` refresh token removes the stored one.
    Replace { access: String, refresh: Option<String> },
    /// Write the access token; write the refresh token only when rotated.
    Rotate { access: String, refresh: Option<String> },
    Clear,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub session: Session,
    pub sync: TokenSync,
    pub navigation: Option<NavigationIntent>,
    /// False when the action was stale or redundant and nothing changed.
    pub applied: bool,
}

impl Transition {
    fn unchanged(current: &Session) -> Self {
        Self { session: current.clone(), sync: TokenSync::Keep, navigation: None, applied: false }
    }

    fn to(session: Session, sync: TokenSync) -> Self {
        Self { session, sync, navigation: None, applied: true }
    }
}

fn non_empty(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.is_empty())
}

/// Compute the next session for `action`. Performs no I/O.
#[must_use]
pub fn reduce(current: &Session, action: SessionAction) -> Transition {
    match action {
        SessionAction::Restore { access, refresh } => {
            // Login or logout already settled the session; never regress it.
            if !current.is_loading {
                return Transition::unchanged(current);
            }
            let mut next = Session { is_loading: false, ..current.clone() };
            if let Some(access) = non_empty(access) {
                next.access_token = Some(access);
                next.refresh_token = non_empty(refresh);
                next.is_authenticated = true;
            }
            Transition::to(next, TokenSync::Keep)
        }
        SessionAction::Login { user, access, refresh } => {
            let refresh = non_empty(Some(refresh));
            let next = Session {
                user: Some(user),
                access_token: Some(access.clone()),
                refresh_token: refresh.clone(),
                is_authenticated: true,
                is_loading: false,
                last_reason: None,
                generation: current.generation + 1,
            };
            Transition::to(next, TokenSync::Replace { access, refresh })
        }
        SessionAction::Logout { reason } => Transition {
            session: Session::anonymous(current.generation + 1, reason),
            sync: TokenSync::Clear,
            navigation: Some(NavigationIntent::Entry { reason }),
            applied: true,
        },
        SessionAction::SetUser { user, generation } => {
            if !current.is_authenticated || generation != current.generation {
                return Transition::unchanged(current);
            }
            Transition::to(Session { user: Some(user), ..current.clone() }, TokenSync::Keep)
        }
        SessionAction::TokensRefreshed { access, refresh, generation } => {
            if !current.is_authenticated || generation != current.generation || access.is_empty() {
                return Transition::unchanged(current);
            }
            let refresh = non_empty(refresh);
            let next = Session {
                access_token: Some(access.clone()),
                refresh_token: refresh.clone().or_else(|| current.refresh_token.clone()),
                ..current.clone()
            };
            Transition::to(next, TokenSync::Rotate { access, refresh })
        }
    }
}

// =============================================================================
// STORE
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InitState {
    Pending,
    Running,
    Done,
}

type Listener = Rc<dyn Fn(&Session)>;

struct StoreInner {
    session: RefCell<Session>,
    init: Cell<InitState>,
    storage: Rc<dyn TokenStorage>,
    navigator: Rc<dyn Navigator>,
    listeners: RefCell<Vec<Listener>>,
}

/// Shared handle to the visitor's session. Cloning shares the same state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Rc<StoreInner>,
}

impl SessionStore {
    #[must_use]
    pub fn new(storage: Rc<dyn TokenStorage>, navigator: Rc<dyn Navigator>) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                session: RefCell::new(Session::default()),
                init: Cell::new(InitState::Pending),
                storage,
                navigator,
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.inner.session.borrow().clone()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        let session = self.inner.session.borrow();
        if session.is_loading && self.inner.init.get() == InitState::Pending {
            SessionPhase::Uninitialized
        } else {
            session.phase()
        }
    }

    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.inner.session.borrow().access_token.clone()
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.inner.session.borrow().refresh_token.clone()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.session.borrow().generation
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.session.borrow().is_authenticated
    }

    /// Call `listener` with the current session after every applied change.
    pub fn subscribe(&self, listener: impl Fn(&Session) + 'static) {
        self.inner.listeners.borrow_mut().push(Rc::new(listener));
    }

    /// Restore tokens from persistence and end the loading window.
    ///
    /// Only the first call does anything; later calls return `false`.
    pub fn initialize_auth(&self) -> bool {
        if self.inner.init.get() != InitState::Pending {
            return false;
        }
        self.inner.init.set(InitState::Running);
        let access = self.inner.storage.load(TokenKind::Access);
        let refresh = self.inner.storage.load(TokenKind::Refresh);
        self.dispatch(SessionAction::Restore { access, refresh });
        self.inner.init.set(InitState::Done);
        log::info!("session: initialized as {:?}", self.phase());
        true
    }

    /// Persist both tokens and enter the authenticated state with `user`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyAccessToken` if `access` is empty; the
    /// session is left untouched.
    pub fn login(&self, user: User, access: String, refresh: String) -> Result<(), SessionError> {
        if access.is_empty() {
            return Err(SessionError::EmptyAccessToken);
        }
        self.dispatch(SessionAction::Login { user, access, refresh });
        Ok(())
    }

    /// Clear persisted tokens, reset to anonymous, then navigate to the entry
    /// view. Safe to call from any state, including from inside a listener.
    pub fn logout(&self, reason: AuthReason) -> NavigationIntent {
        if reason == AuthReason::SessionExpired {
            log::warn!("session: forced logout, refresh token rejected");
        }
        let transition = self.dispatch(SessionAction::Logout { reason });
        transition.navigation.unwrap_or(NavigationIntent::Entry { reason })
    }

    /// Replace the user of the current session. Ignored when anonymous.
    pub fn set_user(&self, user: User) -> bool {
        let generation = self.generation();
        self.set_user_for(generation, user)
    }

    /// Apply an identity fetched under `generation`; dropped if stale.
    pub fn set_user_for(&self, generation: u64, user: User) -> bool {
        let applied = self.dispatch(SessionAction::SetUser { user, generation }).applied;
        if !applied {
            log::debug!("session: discarded stale identity for generation {generation}");
        }
        applied
    }

    /// Apply refreshed tokens obtained under `generation`; dropped if stale.
    pub fn apply_refreshed_tokens(&self, generation: u64, access: String, refresh: Option<String>) -> bool {
        self.dispatch(SessionAction::TokensRefreshed { access, refresh, generation }).applied
    }

    fn dispatch(&self, action: SessionAction) -> Transition {
        let transition = {
            let current = self.inner.session.borrow();
            reduce(&current, action)
        };
        if !transition.applied {
            return transition;
        }
        self.sync_tokens(&transition.sync);
        self.inner.session.replace(transition.session.clone());
        log::debug!("session: -> {:?}", transition.session.phase());
        self.notify();
        if let Some(intent) = &transition.navigation {
            self.inner.navigator.navigate(intent);
        }
        transition
    }

    fn sync_tokens(&self, sync: &TokenSync) {
        let storage = &self.inner.storage;
        match sync {
            TokenSync::Keep => {}
            TokenSync::Replace { access, refresh } => {
                storage.save(TokenKind::Access, access);
                match refresh {
                    Some(refresh) => storage.save(TokenKind::Refresh, refresh),
                    None => storage.remove(TokenKind::Refresh),
                }
            }
            TokenSync::Rotate { access, refresh } => {
                storage.save(TokenKind::Access, access);
                if let Some(refresh) = refresh {
                    storage.save(TokenKind::Refresh, refresh);
                }
            }
            TokenSync::Clear => {
                storage.remove(TokenKind::Access);
                storage.remove(TokenKind::Refresh);
            }
        }
    }

    fn notify(&self) {
        let listeners = self.inner.listeners.borrow().clone();
        for listener in listeners {
            // Re-read per listener: an earlier listener may have re-entered the store.
            let current = self.snapshot();
            listener(&current);
        }
    }
}
