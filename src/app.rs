//! Root application component with routing and context providers.
//!
//! SYSTEM CONTEXT
//! ==============
//! `App` owns the one `SessionServices` of this load. The store's snapshots
//! are mirrored into an `RwSignal<Session>` so guards and pages react to
//! every transition, including ones made by the HTTP adapter in the
//! background. Bootstrap starts only in the hydrated browser; a server render
//! keeps the session loading, so guards emit the loading indicator on both
//! sides and hydration matches.
//!
//! ROUTING
//! =======
//! View paths come from `RouteConfig`, the same values the guards and the
//! navigator redirect to, so they are matched at runtime by one catch-all
//! route instead of static segments.

use leptos::prelude::*;
use leptos_meta::{MetaTags, Title, provide_meta_context};
use leptos_router::{
    WildcardSegment,
    components::{Redirect, Route, Router, Routes},
    hooks::use_location,
};

use crate::components::route_guard::{GuestOnly, RequireAuth};
use crate::config::{ClientConfig, RouteConfig, RouteView};
use crate::pages::{dashboard::DashboardPage, login::LoginPage, signup::SignupPage};
use crate::state::services::SessionServices;
use crate::state::session::Session;

/// HTML shell rendered on the server for SSR + hydration.
pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <AutoReload options=options.clone()/>
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}

/// Mirror every store transition into `signal`.
fn mirror_session(services: &SessionServices, signal: RwSignal<Session>) {
    services.store.subscribe(move |session| {
        if signal.try_set(session.clone()).is_some() {
            log::debug!("app: session signal disposed; dropping update");
        }
    });
}

/// Root application component.
///
/// Provides the session contexts and sets up client-side routing.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let config = ClientConfig::from_build_env();
    let services = SessionServices::for_environment(&config);

    let session = RwSignal::new(services.store.snapshot());
    mirror_session(&services, session);

    provide_context(session);
    provide_context(config.routes.clone());
    provide_context(StoredValue::new_local(services.clone()));

    #[cfg(feature = "hydrate")]
    {
        let bootstrapper = services.bootstrapper.clone();
        leptos::task::spawn_local(async move {
            bootstrapper.run().await;
        });
    }

    view! {
        <Title text="Matching"/>

        <Router>
            <Routes fallback=|| "Page not found.".into_view()>
                <Route path=WildcardSegment("path") view=ConfiguredRoute/>
            </Routes>
        </Router>
    }
}

/// Render the view the current pathname resolves to under `RouteConfig`.
#[component]
fn ConfiguredRoute() -> impl IntoView {
    let routes = expect_context::<RouteConfig>();
    let location = use_location();
    let resolver = routes.clone();
    let current = Memo::new(move |_| resolver.resolve(&location.pathname.get()));

    move || match current.get() {
        RouteView::Entry => view! { <GuestOnly><LoginPage/></GuestOnly> }.into_any(),
        RouteView::Signup => view! { <GuestOnly><SignupPage/></GuestOnly> }.into_any(),
        RouteView::Landing => view! { <RequireAuth><DashboardPage/></RequireAuth> }.into_any(),
        RouteView::Root => view! { <Redirect path=routes.landing_path.clone()/> }.into_any(),
        RouteView::NotFound => "Page not found.".into_any(),
    }
}
