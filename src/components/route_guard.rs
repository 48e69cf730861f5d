//! Guard wrappers for protected and entry routes.
//!
//! SYSTEM CONTEXT
//! ==============
//! Pages are wrapped in `RequireAuth` or `GuestOnly` at the router. The
//! wrapped children are only built once the guard answers `Render`; until
//! then, and while a redirect is in flight, a neutral loading indicator is
//! shown so protected content never flashes.

use leptos::prelude::*;
use leptos_router::hooks::use_navigate;

use crate::config::RouteConfig;
use crate::state::session::Session;
use crate::util::auth::{GuardOutcome, entry_guard, install_guard_redirect, protected_guard};

/// Placeholder shown while the session is unresolved.
#[component]
pub fn SessionLoading() -> impl IntoView {
    view! {
        <div class="session-loading" aria-busy="true">
            "Loading..."
        </div>
    }
}

/// Render `children` only for an authenticated session.
#[component]
pub fn RequireAuth(children: ChildrenFn) -> impl IntoView {
    guarded(protected_guard, children)
}

/// Render `children` only for visitors without a session (login, signup).
#[component]
pub fn GuestOnly(children: ChildrenFn) -> impl IntoView {
    guarded(entry_guard, children)
}

fn guarded(guard: fn(&Session) -> GuardOutcome, children: ChildrenFn) -> impl IntoView {
    let session = expect_context::<RwSignal<Session>>();
    let routes = expect_context::<RouteConfig>();
    install_guard_redirect(session, routes, guard, use_navigate());

    let allowed = move || session.with(guard) == GuardOutcome::Render;
    view! {
        <Show when=allowed fallback=|| view! { <SessionLoading/> }>
            {children()}
        </Show>
    }
}
