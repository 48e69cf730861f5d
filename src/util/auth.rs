//! Route guard decisions and the effect that applies them.
//!
//! SYSTEM CONTEXT
//! ==============
//! Protected views and entry views (login, signup) must apply identical redirect
//! behavior. The decision is a pure function of a session snapshot; the
//! Leptos effect only performs the navigation it returns.
//!
//! DESIGN
//! ======
//! While the session is loading every guard answers `Pending`. A redirect
//! decided before `initialize_auth` has run would be based on a session that
//! does not exist yet, which is how redirect loops and flashes of the login
//! view happen.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use leptos::prelude::*;
use leptos_router::NavigateOptions;

use crate::config::RouteConfig;
use crate::state::session::Session;
use crate::util::navigation::{AuthReason, NavigationIntent};

/// What a guarded view should do for the current session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Bootstrap has not finished; render only a loading indicator.
    Pending,
    Redirect(NavigationIntent),
    Render,
}

/// Guard for views that need a session.
#[must_use]
pub fn protected_guard(session: &Session) -> GuardOutcome {
    if session.is_loading {
        return GuardOutcome::Pending;
    }
    if session.is_authenticated {
        return GuardOutcome::Render;
    }
    let reason = session.last_reason.unwrap_or(AuthReason::Unauthenticated);
    GuardOutcome::Redirect(NavigationIntent::Entry { reason })
}

/// Guard for login/signup: signed-in visitors go to the landing view.
#[must_use]
pub fn entry_guard(session: &Session) -> GuardOutcome {
    if session.is_loading {
        return GuardOutcome::Pending;
    }
    if session.is_authenticated {
        GuardOutcome::Redirect(NavigationIntent::Landing)
    } else {
        GuardOutcome::Render
    }
}

#[must_use]
pub fn should_redirect_unauth(session: &Session) -> bool {
    matches!(protected_guard(session), GuardOutcome::Redirect(_))
}

/// Navigate whenever `guard` answers `Redirect` for the current session.
pub fn install_guard_redirect<F>(session: RwSignal<Session>, routes: RouteConfig, guard: fn(&Session) -> GuardOutcome, navigate: F)
where
    F: Fn(&str, NavigateOptions) + Clone + 'static,
{
    Effect::new(move || {
        let outcome = session.with(guard);
        if let GuardOutcome::Redirect(intent) = outcome {
            log::debug!("guard: redirecting to {}", intent.path(&routes));
            navigate(&intent.href(&routes), NavigateOptions { replace: true, ..NavigateOptions::default() });
        }
    });
}
