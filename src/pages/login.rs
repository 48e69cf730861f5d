//! Login page: identifier + password sign-in.
//!
//! SYSTEM CONTEXT
//! ==============
//! Mounted behind `GuestOnly`. A successful sign-in only updates the session
//! store; the guard then sends the visitor to the landing view. Credential
//! errors stay on this page and never touch the session.

#[cfg(test)]
#[path = "login_test.rs"]
mod login_test;

use leptos::prelude::*;
use leptos_router::components::A;
use leptos_router::hooks::use_query_map;

use crate::config::RouteConfig;
#[cfg(any(test, feature = "hydrate"))]
use crate::net::api;
#[cfg(any(test, feature = "hydrate"))]
use crate::net::client::ApiClient;
use crate::net::types::LoginRequest;
use crate::state::services::SessionServices;
use crate::util::navigation::AuthReason;

/// Trim the identifier and require both fields.
fn validate_login_input(identifier: &str, password: &str) -> Result<LoginRequest, &'static str> {
    let identifier = identifier.trim();
    if identifier.is_empty() || password.is_empty() {
        return Err("Enter your username or email and password.");
    }
    Ok(LoginRequest { identifier: identifier.to_owned(), password: password.to_owned() })
}

/// Banner text for the `reason` query marker, if any.
fn reason_banner(raw: Option<&str>) -> Option<&'static str> {
    raw.and_then(AuthReason::from_query_value).map(AuthReason::message)
}

/// Exchange credentials and enter the authenticated state.
#[cfg(any(test, feature = "hydrate"))]
async fn sign_in(client: &ApiClient, request: LoginRequest) -> Result<(), String> {
    let response = api::login(client, &request).await.map_err(|e| e.user_message())?;
    client
        .store()
        .login(response.user, response.access, response.refresh)
        .map_err(|e| e.to_string())
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let services = expect_context::<StoredValue<SessionServices, LocalStorage>>();
    let routes = expect_context::<RouteConfig>();
    let query = use_query_map();

    let identifier = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let error = RwSignal::new(String::new());
    let busy = RwSignal::new(false);

    let banner = move || reason_banner(query.read().get(AuthReason::QUERY_KEY).as_deref());

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let request = match validate_login_input(&identifier.get(), &password.get()) {
            Ok(request) => request,
            Err(message) => {
                error.set(message.to_owned());
                return;
            }
        };
        busy.set(true);
        error.set(String::new());

        #[cfg(feature = "hydrate")]
        {
            let client = services.with_value(|s| s.client.clone());
            leptos::task::spawn_local(async move {
                if let Err(message) = sign_in(&client, request).await {
                    error.set(message);
                    password.set(String::new());
                }
                busy.set(false);
            });
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (services, request);
        }
    };

    view! {
        <div class="login-page">
            <div class="login-card">
                <h1>"Sign in"</h1>
                {move || banner().map(|text| view! { <p class="login-message login-message--info">{text}</p> })}
                <form class="login-form" on:submit=on_submit>
                    <input
                        class="login-input"
                        type="text"
                        autocomplete="username"
                        placeholder="Username or email"
                        prop:value=move || identifier.get()
                        on:input=move |ev| identifier.set(event_target_value(&ev))
                    />
                    <input
                        class="login-input"
                        type="password"
                        autocomplete="current-password"
                        placeholder="Password"
                        prop:value=move || password.get()
                        on:input=move |ev| password.set(event_target_value(&ev))
                    />
                    <button class="login-button" type="submit" disabled=move || busy.get()>
                        {move || if busy.get() { "Signing in..." } else { "Sign in" }}
                    </button>
                </form>
                <Show when=move || !error.get().is_empty()>
                    <p class="login-message login-message--error">{move || error.get()}</p>
                </Show>
                <p class="login-footer">
                    "New here? "
                    <A href=routes.signup_path.clone()>"Create an account"</A>
                </p>
            </div>
        </div>
    }
}
