//! Authenticated landing page.
//!
//! SYSTEM CONTEXT
//! ==============
//! Mounted behind `RequireAuth`. The identity may still be unknown when this
//! renders (bootstrap fetch pending or failed), so everything identity-bound
//! waits for `session.user`. Role decides which profile variant is loaded.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use leptos::prelude::*;

use crate::net::types::{Profile, Role};
use crate::state::services::SessionServices;
use crate::state::session::Session;
use crate::util::navigation::AuthReason;

fn greeting(session: &Session) -> String {
    match &session.user {
        Some(user) => format!("Welcome, {}", user.display_name()),
        None => "Welcome back".to_owned(),
    }
}

fn non_blank(label: &'static str, value: Option<&str>) -> Option<(&'static str, String)> {
    let value = value?.trim();
    (!value.is_empty()).then(|| (label, value.to_owned()))
}

/// Label/value rows for the profile card, skipping unset fields.
fn profile_summary(profile: &Profile) -> Vec<(&'static str, String)> {
    let base = profile.base();
    let mut rows = vec![non_blank("Location", base.location.as_deref()), non_blank("Bio", base.bio.as_deref())];
    match profile {
        Profile::Seeker(p) => {
            rows.push(non_blank("Industry", p.industry_interest.as_deref()));
            rows.push(non_blank("Needs", p.required_services.as_deref()));
            rows.push(non_blank("Budget", p.budget_range.as_deref()));
        }
        Profile::Provider(p) => {
            rows.push(non_blank("Company", p.company_name.as_deref()));
            rows.push(non_blank("Services", p.services_offered.as_deref()));
            rows.push(p.experience_years.map(|years| ("Experience", format!("{years} years"))));
            rows.push(non_blank("Hourly rate", p.hourly_rate.as_deref()));
        }
    }
    rows.into_iter().flatten().collect()
}

fn match_count_label(count: usize) -> String {
    if count == 1 { "1 match".to_owned() } else { format!("{count} matches") }
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::Seeker => "Service seeker",
        Role::Provider => "Service provider",
        Role::Admin => "Administrator",
    }
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let session = expect_context::<RwSignal<Session>>();
    let services = expect_context::<StoredValue<SessionServices, LocalStorage>>();

    let profile = RwSignal::new(None::<Profile>);
    let profile_error = RwSignal::new(String::new());
    let match_count = RwSignal::new(None::<usize>);

    // Load role-bound data once, as soon as the identity is known.
    let requested = RwSignal::new(false);
    Effect::new(move || {
        if requested.get_untracked() {
            return;
        }
        let Some(role) = session.with(|s| s.user.as_ref().map(|u| u.role)) else {
            return;
        };
        requested.set(true);

        #[cfg(feature = "hydrate")]
        {
            use crate::error::ErrorCategory;
            use crate::net::api::{self, MatchSource};
            use crate::net::types::MatchFilters;

            let client = services.with_value(|s| s.client.clone());
            leptos::task::spawn_local(async move {
                if role != Role::Admin {
                    match api::fetch_my_profile(&client, role).await {
                        Ok(loaded) => profile.set(Some(loaded)),
                        Err(e) => {
                            // A dead session is already being redirected.
                            if e.category_for(client.store().is_authenticated()) != ErrorCategory::SessionInvalid {
                                profile_error.set(e.user_message());
                            }
                        }
                    }
                }
                match api::fetch_matches(&client, MatchSource::Matches, &MatchFilters::default()).await {
                    Ok(items) => match_count.set(Some(items.len())),
                    Err(e) => log::warn!("dashboard: match listing failed: {e}"),
                }
            });
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = role;
        }
    });

    let on_logout = move |_| {
        let store = services.with_value(|s| s.store.clone());
        store.logout(AuthReason::SignedOut);
    };

    view! {
        <div class="dashboard-page">
            <header class="dashboard-header">
                <h1>{move || session.with(greeting)}</h1>
                <span class="dashboard-role">
                    {move || session.with(|s| s.user.as_ref().map(|u| role_label(u.role)))}
                </span>
                <button class="dashboard-logout" on:click=on_logout>"Log out"</button>
            </header>
            <section class="dashboard-profile">
                <h2>"Profile"</h2>
                {move || {
                    profile
                        .get()
                        .map(|p| {
                            profile_summary(&p)
                                .into_iter()
                                .map(|(label, value)| view! {
                                    <div class="profile-row">
                                        <span class="profile-row__label">{label}</span>
                                        <span class="profile-row__value">{value}</span>
                                    </div>
                                })
                                .collect_view()
                        })
                }}
                <Show when=move || !profile_error.get().is_empty()>
                    <p class="dashboard-error">{move || profile_error.get()}</p>
                </Show>
            </section>
            <section class="dashboard-matches">
                <h2>"Matches"</h2>
                <p>{move || match_count.get().map_or_else(|| "Loading...".to_owned(), match_count_label)}</p>
            </section>
        </div>
    }
}
