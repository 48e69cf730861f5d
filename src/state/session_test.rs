use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::net::types::Role;
use crate::test_support::{RecordingNavigator, user};
use crate::util::token_storage::MemoryTokenStorage;

// =============================================================
// Helpers
// =============================================================

struct Fixture {
    store: SessionStore,
    storage: Rc<MemoryTokenStorage>,
    navigator: Rc<RecordingNavigator>,
}

fn fixture_with(storage: MemoryTokenStorage) -> Fixture {
    let storage = Rc::new(storage);
    let navigator = Rc::new(RecordingNavigator::default());
    let store = SessionStore::new(storage.clone(), navigator.clone());
    Fixture { store, storage, navigator }
}

fn fixture() -> Fixture {
    fixture_with(MemoryTokenStorage::new())
}

fn stored(f: &Fixture, kind: TokenKind) -> Option<String> {
    f.storage.load(kind)
}

// =============================================================
// reduce (pure)
// =============================================================

#[test]
fn restore_with_token_authenticates_without_user() {
    let t = reduce(
        &Session::default(),
        SessionAction::Restore { access: Some("OLD".to_owned()), refresh: Some("R".to_owned()) },
    );
    assert!(t.applied);
    assert_eq!(t.sync, TokenSync::Keep);
    assert_eq!(t.session.phase(), SessionPhase::AuthenticatedNoUser);
    assert_eq!(t.session.access_token.as_deref(), Some("OLD"));
    assert_eq!(t.session.refresh_token.as_deref(), Some("R"));
}

#[test]
fn restore_treats_empty_token_as_absent() {
    let t = reduce(&Session::default(), SessionAction::Restore { access: Some(String::new()), refresh: None });
    assert!(t.session.is_anonymous());
}

#[test]
fn restore_after_settled_session_is_ignored() {
    let settled = reduce(
        &Session::default(),
        SessionAction::Login { user: user(1, Role::Seeker), access: "A1".to_owned(), refresh: "R1".to_owned() },
    )
    .session;
    let t = reduce(&settled, SessionAction::Restore { access: Some("OTHER".to_owned()), refresh: None });
    assert!(!t.applied);
    assert_eq!(t.session, settled);
}

#[test]
fn login_replaces_both_tokens_and_bumps_generation() {
    let t = reduce(
        &Session::default(),
        SessionAction::Login { user: user(1, Role::Seeker), access: "A1".to_owned(), refresh: "R1".to_owned() },
    );
    assert_eq!(t.sync, TokenSync::Replace { access: "A1".to_owned(), refresh: Some("R1".to_owned()) });
    assert_eq!(t.session.generation, 1);
    assert_eq!(t.session.phase(), SessionPhase::Authenticated);
    assert!(t.navigation.is_none());
}

#[test]
fn logout_clears_and_requests_entry_navigation() {
    let t = reduce(&Session::default(), SessionAction::Logout { reason: AuthReason::SignedOut });
    assert_eq!(t.sync, TokenSync::Clear);
    assert_eq!(t.navigation, Some(NavigationIntent::Entry { reason: AuthReason::SignedOut }));
    assert!(t.session.is_anonymous());
    assert_eq!(t.session.last_reason, Some(AuthReason::SignedOut));
}

#[test]
fn set_user_on_anonymous_session_is_dropped() {
    let anonymous = reduce(&Session::default(), SessionAction::Logout { reason: AuthReason::SignedOut }).session;
    let t = reduce(&anonymous, SessionAction::SetUser { user: user(1, Role::Seeker), generation: anonymous.generation });
    assert!(!t.applied);
    assert!(t.session.user.is_none());
}

#[test]
fn refreshed_tokens_keep_refresh_unless_rotated() {
    let base = reduce(
        &Session::default(),
        SessionAction::Restore { access: Some("A1".to_owned()), refresh: Some("R1".to_owned()) },
    )
    .session;
    let plain = reduce(&base, SessionAction::TokensRefreshed { access: "A2".to_owned(), refresh: None, generation: 0 });
    assert_eq!(plain.session.refresh_token.as_deref(), Some("R1"));
    assert_eq!(plain.sync, TokenSync::Rotate { access: "A2".to_owned(), refresh: None });

    let rotated = reduce(
        &base,
        SessionAction::TokensRefreshed { access: "A2".to_owned(), refresh: Some("R2".to_owned()), generation: 0 },
    );
    assert_eq!(rotated.session.refresh_token.as_deref(), Some("R2"));
}

#[test]
fn refreshed_tokens_from_old_generation_are_dropped() {
    let base = reduce(
        &Session::default(),
        SessionAction::Login { user: user(1, Role::Seeker), access: "A1".to_owned(), refresh: "R1".to_owned() },
    )
    .session;
    let t = reduce(&base, SessionAction::TokensRefreshed { access: "A2".to_owned(), refresh: None, generation: 0 });
    assert!(!t.applied);
    assert_eq!(t.session.access_token.as_deref(), Some("A1"));
}

#[test]
fn debug_output_redacts_tokens() {
    let session = Session { access_token: Some("secret-access".to_owned()), ..Session::default() };
    let rendered = format!("{session:?}");
    assert!(!rendered.contains("secret-access"));
    assert!(rendered.contains("<redacted>"));
}

// =============================================================
// SessionStore lifecycle
// =============================================================

#[test]
fn new_store_is_uninitialized_and_loading() {
    let f = fixture();
    assert_eq!(f.store.phase(), SessionPhase::Uninitialized);
    assert!(f.store.snapshot().is_loading);
}

#[test]
fn initialize_without_tokens_is_anonymous() {
    let f = fixture();
    assert!(f.store.initialize_auth());
    assert_eq!(f.store.phase(), SessionPhase::Anonymous);
    assert!(f.store.snapshot().is_anonymous());
    assert!(f.navigator.intents().is_empty());
}

#[test]
fn initialize_with_preseeded_token_then_set_user() {
    let f = fixture_with(MemoryTokenStorage::seeded(Some("OLD"), None));
    f.store.initialize_auth();
    let session = f.store.snapshot();
    assert!(session.is_authenticated);
    assert!(session.user.is_none());
    assert!(!session.is_loading);
    assert_eq!(f.store.phase(), SessionPhase::AuthenticatedNoUser);

    assert!(f.store.set_user(user(5, Role::Provider)));
    assert_eq!(f.store.snapshot().user.map(|u| u.id), Some(5));
    assert_eq!(f.store.phase(), SessionPhase::Authenticated);
}

#[test]
fn initialize_twice_matches_once() {
    let f = fixture_with(MemoryTokenStorage::seeded(Some("OLD"), Some("R")));
    let calls = Rc::new(RefCell::new(0));
    let counter = calls.clone();
    f.store.subscribe(move |_| *counter.borrow_mut() += 1);

    assert!(f.store.initialize_auth());
    let once = f.store.snapshot();
    assert!(!f.store.initialize_auth());
    assert_eq!(f.store.snapshot(), once);
    assert_eq!(*calls.borrow(), 1);
}

#[test]
fn initialize_after_login_does_not_regress() {
    let f = fixture_with(MemoryTokenStorage::seeded(Some("STALE"), None));
    f.store.login(user(1, Role::Seeker), "A1".to_owned(), "R1".to_owned()).unwrap();
    f.store.initialize_auth();
    let session = f.store.snapshot();
    assert_eq!(session.phase(), SessionPhase::Authenticated);
    assert_eq!(session.access_token.as_deref(), Some("A1"));
}

#[test]
fn login_scenario_persists_tokens() {
    let f = fixture();
    f.store.initialize_auth();
    f.store.login(user(1, Role::Seeker), "A1".to_owned(), "R1".to_owned()).unwrap();

    let session = f.store.snapshot();
    assert!(session.is_authenticated);
    assert_eq!(session.user.as_ref().map(|u| u.role), Some(Role::Seeker));
    assert_eq!(stored(&f, TokenKind::Access).as_deref(), Some("A1"));
    assert_eq!(stored(&f, TokenKind::Refresh).as_deref(), Some("R1"));
}

#[test]
fn login_with_empty_access_token_is_rejected() {
    let f = fixture();
    f.store.initialize_auth();
    let err = f.store.login(user(1, Role::Seeker), String::new(), "R1".to_owned()).unwrap_err();
    assert_eq!(err, SessionError::EmptyAccessToken);
    assert!(f.store.snapshot().is_anonymous());
    assert_eq!(stored(&f, TokenKind::Refresh), None);
}

#[test]
fn login_then_logout_returns_to_anonymous_for_any_sequence() {
    let f = fixture();
    f.store.initialize_auth();
    for round in 0..3 {
        for n in 0..=round {
            f.store
                .login(user(n, Role::Provider), format!("A{n}"), format!("R{n}"))
                .unwrap();
        }
        f.store.logout(AuthReason::SignedOut);
        let session = f.store.snapshot();
        assert!(session.is_anonymous());
        assert_eq!(stored(&f, TokenKind::Access), None);
        assert_eq!(stored(&f, TokenKind::Refresh), None);
    }
}

#[test]
fn logout_navigates_to_entry_with_reason() {
    let f = fixture();
    f.store.initialize_auth();
    f.store.login(user(1, Role::Seeker), "A1".to_owned(), "R1".to_owned()).unwrap();
    let intent = f.store.logout(AuthReason::SessionExpired);
    assert_eq!(intent, NavigationIntent::Entry { reason: AuthReason::SessionExpired });
    assert_eq!(f.navigator.intents(), vec![intent]);
    assert_eq!(f.store.snapshot().last_reason, Some(AuthReason::SessionExpired));
}

#[test]
fn logout_from_anonymous_still_navigates() {
    let f = fixture();
    f.store.initialize_auth();
    f.store.logout(AuthReason::SignedOut);
    assert_eq!(f.navigator.intents().len(), 1);
}

#[test]
fn late_identity_after_logout_is_discarded() {
    let f = fixture_with(MemoryTokenStorage::seeded(Some("OLD"), None));
    f.store.initialize_auth();
    let started_under = f.store.generation();
    f.store.logout(AuthReason::SignedOut);

    assert!(!f.store.set_user_for(started_under, user(9, Role::Seeker)));
    assert!(f.store.snapshot().is_anonymous());
}

#[test]
fn identity_from_before_relogin_is_discarded() {
    let f = fixture_with(MemoryTokenStorage::seeded(Some("OLD"), None));
    f.store.initialize_auth();
    let started_under = f.store.generation();
    f.store.logout(AuthReason::SignedOut);
    f.store.login(user(2, Role::Provider), "A2".to_owned(), "R2".to_owned()).unwrap();

    assert!(!f.store.set_user_for(started_under, user(9, Role::Seeker)));
    assert_eq!(f.store.snapshot().user.map(|u| u.id), Some(2));
}

#[test]
fn refreshed_tokens_are_mirrored_to_storage() {
    let f = fixture_with(MemoryTokenStorage::seeded(Some("A1"), Some("R1")));
    f.store.initialize_auth();
    let generation = f.store.generation();
    assert!(f.store.apply_refreshed_tokens(generation, "A2".to_owned(), Some("R2".to_owned())));
    assert_eq!(stored(&f, TokenKind::Access).as_deref(), Some("A2"));
    assert_eq!(stored(&f, TokenKind::Refresh).as_deref(), Some("R2"));
    assert_eq!(f.store.access_token().as_deref(), Some("A2"));
}

// =============================================================
// Listeners and reentrancy
// =============================================================

#[test]
fn listener_never_observes_half_cleared_session() {
    let f = fixture();
    f.store.initialize_auth();
    f.store.login(user(1, Role::Seeker), "A1".to_owned(), "R1".to_owned()).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    f.store.subscribe(move |s| {
        let consistent = s.is_authenticated == s.access_token.is_some() && (s.user.is_none() || s.is_authenticated);
        sink.borrow_mut().push(consistent);
    });
    f.store.logout(AuthReason::SessionExpired);
    assert_eq!(*seen.borrow(), vec![true]);
}

#[test]
fn logout_from_inside_listener_is_safe() {
    let f = fixture();
    f.store.initialize_auth();

    let reentrant = f.store.clone();
    f.store.subscribe(move |s| {
        if s.is_authenticated && s.user.as_ref().is_some_and(|u| u.role == Role::Admin) {
            reentrant.logout(AuthReason::SessionExpired);
        }
    });
    let last = Rc::new(RefCell::new(None));
    let sink = last.clone();
    f.store.subscribe(move |s| *sink.borrow_mut() = Some(s.clone()));

    f.store.login(user(1, Role::Admin), "A1".to_owned(), "R1".to_owned()).unwrap();

    assert!(f.store.snapshot().is_anonymous());
    assert!(last.borrow().as_ref().is_some_and(Session::is_anonymous));
    assert_eq!(stored(&f, TokenKind::Access), None);
    assert_eq!(f.navigator.intents(), vec![NavigationIntent::Entry { reason: AuthReason::SessionExpired }]);
}
