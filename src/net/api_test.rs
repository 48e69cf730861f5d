use std::rc::Rc;

use serde_json::json;

use super::*;
use crate::net::types::SeekerProfileUpdate;
use crate::state::session::SessionStore;
use crate::test_support::{RecordingNavigator, ScriptedTransport, json_response, user};
use crate::util::token_storage::MemoryTokenStorage;

fn client_with(
    access: Option<&str>,
    handler: impl Fn(&ApiRequest) -> Result<crate::net::transport::ApiResponse, ApiError> + 'static,
) -> (ApiClient, Rc<ScriptedTransport>) {
    let transport = ScriptedTransport::new(handler);
    let store = SessionStore::new(
        Rc::new(MemoryTokenStorage::seeded(access, access.map(|_| "R1"))),
        Rc::new(RecordingNavigator::default()),
    );
    store.initialize_auth();
    (ApiClient::new(transport.clone(), store), transport)
}

fn seeker_profile_json() -> serde_json::Value {
    json!({
        "id": 9,
        "bio": "hello",
        "user": serde_json::to_value(user(1, Role::Seeker)).unwrap(),
        "industry_interest": "retail"
    })
}

// =============================================================
// Pure helpers
// =============================================================

#[test]
fn match_sources_map_to_listing_paths() {
    assert_eq!(MatchSource::Matches.path(), "/matching/matches/");
    assert_eq!(MatchSource::Ranked.path(), "/matching/ml/");
    assert_eq!(MatchSource::Opportunities.path(), "/matching/opportunities/");
}

#[test]
fn profile_writes_use_patch_or_put() {
    assert_eq!(profile_write_method(false), Method::Patch);
    assert_eq!(profile_write_method(true), Method::Put);
}

// =============================================================
// Anonymous endpoints
// =============================================================

#[tokio::test]
async fn login_posts_credentials_without_bearer() {
    let (client, transport) = client_with(Some("OLD"), |_| {
        json_response(200, &json!({"access": "A1", "refresh": "R1", "user": user(1, Role::Seeker)}))
    });
    let response = login(&client, &LoginRequest { identifier: "u@x".to_owned(), password: "pw".to_owned() })
        .await
        .unwrap();

    assert_eq!(response.access, "A1");
    assert_eq!(response.user.role, Role::Seeker);
    let calls = transport.calls();
    assert_eq!(calls[0].method, Method::Post);
    assert_eq!(calls[0].path, LOGIN_PATH);
    assert_eq!(calls[0].bearer, None);
    assert_eq!(calls[0].body, Some(json!({"identifier": "u@x", "password": "pw"})));
}

#[tokio::test]
async fn bad_credentials_never_touch_the_session() {
    let (client, transport) =
        client_with(Some("OLD"), |_| json_response(401, &json!({"detail": "No active account found"})));
    let err = login(&client, &LoginRequest { identifier: "u".to_owned(), password: "bad".to_owned() })
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "No active account found");
    assert_eq!(transport.calls().len(), 1);
    assert!(client.store().is_authenticated());
}

#[tokio::test]
async fn register_surfaces_field_errors() {
    let (client, _) = client_with(None, |_| json_response(400, &json!({"email": ["already registered"]})));
    let form = RegisterRequest {
        username: "bob".to_owned(),
        email: "b@x".to_owned(),
        password: "pw".to_owned(),
        password2: "pw".to_owned(),
        role: Role::Provider,
        first_name: String::new(),
        last_name: String::new(),
        consent_given: true,
    };
    let ApiError::Rejected { fields, .. } = register(&client, &form).await.unwrap_err() else {
        panic!("expected Rejected")
    };
    assert_eq!(fields["email"], vec!["already registered".to_owned()]);
}

// =============================================================
// Authenticated endpoints
// =============================================================

#[tokio::test]
async fn fetch_current_user_sends_bearer() {
    let (client, transport) = client_with(Some("A1"), |_| json_response(200, &json!(user(4, Role::Provider))));
    let me = fetch_current_user(&client).await.unwrap();
    assert_eq!(me.id, 4);
    assert_eq!(transport.calls()[0].path, ME_PATH);
    assert_eq!(transport.calls()[0].bearer.as_deref(), Some("A1"));
}

#[tokio::test]
async fn profile_is_decoded_by_role() {
    let (client, _) = client_with(Some("A1"), |_| json_response(200, &seeker_profile_json()));
    let profile = fetch_my_profile(&client, Role::Seeker).await.unwrap();
    assert_eq!(profile.role(), Role::Seeker);
    assert_eq!(profile.base().bio.as_deref(), Some("hello"));

    let err = fetch_my_profile(&client, Role::Admin).await.unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)));
}

#[tokio::test]
async fn profile_update_patches_only_set_fields() {
    let (client, transport) = client_with(Some("A1"), |_| json_response(200, &seeker_profile_json()));
    let update = ProfileUpdate::Seeker(SeekerProfileUpdate {
        location: Some("Cebu".to_owned()),
        ..SeekerProfileUpdate::default()
    });
    update_my_profile(&client, Role::Seeker, &update).await.unwrap();
    replace_my_profile(&client, Role::Seeker, &update).await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls[0].method, Method::Patch);
    assert_eq!(calls[0].body, Some(json!({"location": "Cebu"})));
    assert_eq!(calls[1].method, Method::Put);
}

#[tokio::test]
async fn profile_update_for_wrong_role_is_not_sent() {
    let (client, transport) = client_with(Some("A1"), |_| json_response(200, &json!({})));
    let update = ProfileUpdate::Seeker(SeekerProfileUpdate::default());
    let err = update_my_profile(&client, Role::Provider, &update).await.unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)));
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn matches_pass_filters_and_accept_paginated_bodies() {
    let (client, transport) = client_with(Some("A1"), |req| match req.path.as_str() {
        "/matching/ml/" => json_response(200, &json!({"count": 1, "results": [{"score": 0.9}]})),
        _ => json_response(200, &json!([{"id": 1}, {"id": 2}])),
    });
    let filters = MatchFilters { industry: Some("finance".to_owned()), location: Some("  ".to_owned()) };

    let opportunities = fetch_matches(&client, MatchSource::Opportunities, &filters).await.unwrap();
    assert_eq!(opportunities.len(), 2);
    assert_eq!(transport.calls()[0].query, vec![("industry".to_owned(), "finance".to_owned())]);

    let ranked = fetch_matches(&client, MatchSource::Ranked, &MatchFilters::default()).await.unwrap();
    assert_eq!(ranked, vec![json!({"score": 0.9})]);
}

#[tokio::test]
async fn non_list_match_body_is_a_parse_error() {
    let (client, _) = client_with(Some("A1"), |_| json_response(200, &json!({"detail": "ok"})));
    let err = fetch_matches(&client, MatchSource::Matches, &MatchFilters::default()).await.unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)));
}
