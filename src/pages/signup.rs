//! Signup page: account creation followed by an immediate sign-in.
//!
//! SYSTEM CONTEXT
//! ==============
//! Mounted behind `GuestOnly`, like the login page. Registration does not
//! return tokens, so a successful signup signs in with the same credentials
//! and hands the result to the session store. Field errors from the server
//! are shown next to the input they belong to.

#[cfg(test)]
#[path = "signup_test.rs"]
mod signup_test;

use std::collections::BTreeMap;

use leptos::prelude::*;
use leptos_router::components::A;

use crate::config::RouteConfig;
use crate::error::ApiError;
#[cfg(any(test, feature = "hydrate"))]
use crate::net::api;
#[cfg(any(test, feature = "hydrate"))]
use crate::net::client::ApiClient;
#[cfg(any(test, feature = "hydrate"))]
use crate::net::types::LoginRequest;
use crate::net::types::{RegisterRequest, Role};
#[cfg(feature = "hydrate")]
use crate::state::services::SessionServices;

/// Server keys rendered next to a form input; anything else is listed above
/// the form.
const FORM_FIELDS: [&str; 6] = ["username", "email", "first_name", "last_name", "password", "password2"];

/// Trim the text fields and check what can be checked before any request.
fn validate_signup_input(form: RegisterRequest) -> Result<RegisterRequest, &'static str> {
    let form = RegisterRequest {
        username: form.username.trim().to_owned(),
        email: form.email.trim().to_owned(),
        first_name: form.first_name.trim().to_owned(),
        last_name: form.last_name.trim().to_owned(),
        ..form
    };
    if form.username.is_empty() || form.email.is_empty() || form.password.is_empty() {
        return Err("Enter a username, email, and password.");
    }
    if form.password != form.password2 {
        return Err("Passwords do not match.");
    }
    if !form.consent_given {
        return Err("Please accept the terms to create an account.");
    }
    Ok(form)
}

/// Roles offered on the signup form.
fn parse_role(raw: &str) -> Option<Role> {
    match raw {
        "seeker" => Some(Role::Seeker),
        "provider" => Some(Role::Provider),
        _ => None,
    }
}

/// Why a signup attempt failed, split for display.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct SignupFailure {
    message: String,
    fields: BTreeMap<String, Vec<String>>,
}

impl SignupFailure {
    fn from_message(message: impl Into<String>) -> Self {
        Self { message: message.into(), fields: BTreeMap::new() }
    }

    fn is_empty(&self) -> bool {
        self.message.is_empty() && self.fields.is_empty()
    }

    /// Messages for one form input, joined for a single line.
    fn field(&self, key: &str) -> Option<String> {
        self.fields.get(key).map(|messages| messages.join(" "))
    }

    /// Messages for keys with no input of their own.
    fn general(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(key, _)| !FORM_FIELDS.contains(&key.as_str()))
            .flat_map(|(key, messages)| {
                messages.iter().map(move |message| {
                    if key == "non_field_errors" { message.clone() } else { format!("{key}: {message}") }
                })
            })
            .collect()
    }
}

impl From<ApiError> for SignupFailure {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Rejected { detail, fields, .. } if !fields.is_empty() => Self {
                message: detail.unwrap_or_else(|| "Please correct the errors below.".to_owned()),
                fields,
            },
            other => Self::from_message(other.user_message()),
        }
    }
}

/// Register, then sign in with the new credentials.
#[cfg(any(test, feature = "hydrate"))]
async fn sign_up(client: &ApiClient, request: RegisterRequest) -> Result<(), SignupFailure> {
    api::register(client, &request).await?;
    log::info!("signup: account created");

    let credentials = LoginRequest { identifier: request.username, password: request.password };
    let response = api::login(client, &credentials)
        .await
        .map_err(|e| SignupFailure::from_message(format!("Account created, but sign-in failed: {}", e.user_message())))?;
    client
        .store()
        .login(response.user, response.access, response.refresh)
        .map_err(|e| SignupFailure::from_message(e.to_string()))
}

#[component]
pub fn SignupPage() -> impl IntoView {
    #[cfg(feature = "hydrate")]
    let services = expect_context::<StoredValue<SessionServices, LocalStorage>>();
    let routes = expect_context::<RouteConfig>();

    let username = RwSignal::new(String::new());
    let email = RwSignal::new(String::new());
    let first_name = RwSignal::new(String::new());
    let last_name = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let password2 = RwSignal::new(String::new());
    let role = RwSignal::new(Role::Seeker);
    let consent = RwSignal::new(false);
    let failure = RwSignal::new(SignupFailure::default());
    let busy = RwSignal::new(false);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let form = RegisterRequest {
            username: username.get(),
            email: email.get(),
            password: password.get(),
            password2: password2.get(),
            role: role.get(),
            first_name: first_name.get(),
            last_name: last_name.get(),
            consent_given: consent.get(),
        };
        let request = match validate_signup_input(form) {
            Ok(request) => request,
            Err(message) => {
                failure.set(SignupFailure::from_message(message));
                return;
            }
        };
        busy.set(true);
        failure.set(SignupFailure::default());

        #[cfg(feature = "hydrate")]
        {
            let client = services.with_value(|s| s.client.clone());
            leptos::task::spawn_local(async move {
                if let Err(err) = sign_up(&client, request).await {
                    failure.set(err);
                    password.set(String::new());
                    password2.set(String::new());
                }
                busy.set(false);
            });
        }
        #[cfg(not(feature = "hydrate"))]
        drop(request);
    };

    let field_error = move |key: &'static str| {
        move || failure.with(|f| f.field(key)).map(|text| view! { <p class="signup-field-error">{text}</p> })
    };
    let text_input = move |key: &'static str, label: &'static str, kind: &'static str, value: RwSignal<String>| {
        view! {
            <label class="signup-label">
                {label}
                <input
                    class="signup-input"
                    type=kind
                    name=key
                    autocomplete=if kind == "password" { "new-password" } else { key }
                    prop:value=move || value.get()
                    on:input=move |ev| value.set(event_target_value(&ev))
                />
            </label>
            {field_error(key)}
        }
    };

    view! {
        <div class="signup-page">
            <div class="signup-card">
                <h1>"Create your account"</h1>
                <Show when=move || failure.with(|f| !f.is_empty())>
                    <div class="signup-message signup-message--error">
                        <p>{move || failure.with(|f| f.message.clone())}</p>
                        <For
                            each=move || failure.with(SignupFailure::general)
                            key=|message| message.clone()
                            children=|message| view! { <p>{message}</p> }
                        />
                    </div>
                </Show>
                <form class="signup-form" on:submit=on_submit>
                    {text_input("username", "Username", "text", username)}
                    {text_input("email", "Email address", "email", email)}
                    {text_input("first_name", "First name", "text", first_name)}
                    {text_input("last_name", "Last name", "text", last_name)}
                    {text_input("password", "Password", "password", password)}
                    {text_input("password2", "Confirm password", "password", password2)}
                    <label class="signup-label">
                        "I am a"
                        <select
                            class="signup-input"
                            on:change=move |ev| {
                                if let Some(selected) = parse_role(&event_target_value(&ev)) {
                                    role.set(selected);
                                }
                            }
                        >
                            <option value="seeker" selected=move || role.get() == Role::Seeker>
                                "Seeker (looking for services)"
                            </option>
                            <option value="provider" selected=move || role.get() == Role::Provider>
                                "Provider (offering services)"
                            </option>
                        </select>
                    </label>
                    <label class="signup-consent">
                        <input
                            type="checkbox"
                            prop:checked=move || consent.get()
                            on:change=move |ev| consent.set(event_target_checked(&ev))
                        />
                        "I agree to the terms of service"
                    </label>
                    <button class="signup-button" type="submit" disabled=move || busy.get()>
                        {move || if busy.get() { "Creating account..." } else { "Create account" }}
                    </button>
                </form>
                <p class="signup-footer">
                    "Already have an account? "
                    <A href=routes.entry_path.clone()>"Sign in"</A>
                </p>
            </div>
        </div>
    }
}
