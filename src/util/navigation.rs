//! Navigation intents emitted by the session core.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session store never touches `window.location`. It emits a
//! `NavigationIntent` and a `Navigator` decides how (and whether) to act on
//! it. The browser navigator performs a full page load so no reactive state
//! from the old session survives the transition.

#[cfg(test)]
#[path = "navigation_test.rs"]
mod navigation_test;

use crate::config::RouteConfig;

/// Why a visitor is being sent to the entry view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthReason {
    /// No session existed when a protected view was requested.
    Unauthenticated,
    /// The refresh token was rejected; the session was force-closed.
    SessionExpired,
    /// The visitor logged out.
    SignedOut,
}

impl AuthReason {
    pub const QUERY_KEY: &'static str = "reason";

    #[must_use]
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::SessionExpired => "session_expired",
            Self::SignedOut => "signed_out",
        }
    }

    #[must_use]
    pub fn from_query_value(raw: &str) -> Option<Self> {
        match raw {
            "unauthenticated" => Some(Self::Unauthenticated),
            "session_expired" => Some(Self::SessionExpired),
            "signed_out" => Some(Self::SignedOut),
            _ => None,
        }
    }

    /// Info banner for the entry view.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Unauthenticated => "Please log in to continue.",
            Self::SessionExpired => "Your session has expired. Please log in again.",
            Self::SignedOut => "You have been logged out.",
        }
    }
}

/// Where the session core wants the visitor to go next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigationIntent {
    Entry { reason: AuthReason },
    Landing,
}

impl NavigationIntent {
    #[must_use]
    pub fn path<'a>(&self, routes: &'a RouteConfig) -> &'a str {
        match self {
            Self::Entry { .. } => &routes.entry_path,
            Self::Landing => &routes.landing_path,
        }
    }

    #[must_use]
    pub fn href(&self, routes: &RouteConfig) -> String {
        match self {
            Self::Entry { reason } => {
                format!("{}?{}={}", routes.entry_path, AuthReason::QUERY_KEY, reason.as_query_value())
            }
            Self::Landing => routes.landing_path.clone(),
        }
    }
}

/// True unless the visitor is already on the intent's target path.
#[must_use]
pub fn should_navigate(current_path: &str, intent: &NavigationIntent, routes: &RouteConfig) -> bool {
    current_path.trim_end_matches('/') != intent.path(routes).trim_end_matches('/')
}

/// Interprets navigation intents for the current environment.
pub trait Navigator {
    fn navigate(&self, intent: &NavigationIntent);
}

/// Navigator backed by `window.location`; logs and does nothing off-browser.
#[derive(Clone, Debug, Default)]
pub struct LocationNavigator {
    routes: RouteConfig,
}

impl LocationNavigator {
    #[must_use]
    pub fn new(routes: RouteConfig) -> Self {
        Self { routes }
    }
}

impl Navigator for LocationNavigator {
    fn navigate(&self, intent: &NavigationIntent) {
        #[cfg(feature = "hydrate")]
        {
            let Some(window) = web_sys::window() else {
                return;
            };
            let location = window.location();
            let current = location.pathname().unwrap_or_default();
            if !should_navigate(&current, intent, &self.routes) {
                return;
            }
            if location.set_href(&intent.href(&self.routes)).is_err() {
                log::warn!("navigation: failed to redirect to {}", intent.path(&self.routes));
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            log::debug!("navigation: {} (no browser)", intent.href(&self.routes));
        }
    }
}
