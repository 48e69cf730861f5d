use serde_json::json;

use super::*;
use crate::test_support::user;

fn provider_profile() -> Profile {
    let body = json!({
        "id": 2,
        "location": " Davao ",
        "bio": "",
        "user": user(2, Role::Provider),
        "company_name": "Acme Audit",
        "experience_years": 12,
        "hourly_rate": 75
    });
    Profile::decode(Role::Provider, body).unwrap()
}

#[test]
fn greeting_uses_display_name_when_identity_known() {
    let mut known = user(1, Role::Seeker);
    known.first_name = "Ana".to_owned();
    let session = Session { user: Some(known), is_authenticated: true, is_loading: false, ..Session::default() };
    assert_eq!(greeting(&session), "Welcome, Ana");
}

#[test]
fn greeting_falls_back_to_username_then_generic() {
    let session = Session { user: Some(user(3, Role::Seeker)), is_authenticated: true, ..Session::default() };
    assert_eq!(greeting(&session), "Welcome, user3");
    assert_eq!(greeting(&Session::default()), "Welcome back");
}

#[test]
fn provider_summary_skips_blank_fields() {
    let rows = profile_summary(&provider_profile());
    assert_eq!(
        rows,
        vec![
            ("Location", "Davao".to_owned()),
            ("Company", "Acme Audit".to_owned()),
            ("Experience", "12 years".to_owned()),
            ("Hourly rate", "75".to_owned()),
        ]
    );
}

#[test]
fn seeker_summary_uses_seeker_fields() {
    let body = json!({"id": 1, "user": user(1, Role::Seeker), "budget_range": "5k"});
    let rows = profile_summary(&Profile::decode(Role::Seeker, body).unwrap());
    assert_eq!(rows, vec![("Budget", "5k".to_owned())]);
}

#[test]
fn match_count_label_pluralizes() {
    assert_eq!(match_count_label(0), "0 matches");
    assert_eq!(match_count_label(1), "1 match");
    assert_eq!(match_count_label(4), "4 matches");
}

#[test]
fn role_labels() {
    assert_eq!(role_label(Role::Provider), "Service provider");
}
