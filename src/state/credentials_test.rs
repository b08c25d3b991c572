use super::*;

const TOKEN: &str = "header.payload.signature";

fn tiers() -> (Rc<MemoryStorage>, Rc<MemoryStorage>, CredentialStore) {
    let durable = Rc::new(MemoryStorage::new());
    let tab = Rc::new(MemoryStorage::new());
    let store = CredentialStore::new(durable.clone(), tab.clone());
    (durable, tab, store)
}

fn credential() -> Credential {
    Credential { access_token: TOKEN.to_owned(), refresh_token: "refresh".to_owned() }
}

fn user() -> CachedUser {
    CachedUser {
        id: "u1".into(),
        role: "client".into(),
        email: "ana@example.com".into(),
        first_name: "Ana".into(),
        last_name: "Silva".into(),
        last_refreshed_at: 1_700_000_000_000,
    }
}

// =============================================================
// Credential reads and writes
// =============================================================

#[test]
fn empty_store_reports_missing_credential() {
    let (_, _, store) = tiers();
    assert_eq!(store.load_credential(), Err(AuthError::CredentialMissing));
    assert!(!store.has_valid_credential());
}

#[test]
fn session_login_writes_tab_tier_only() {
    let (durable, tab, store) = tiers();
    store.store_credential(&credential(), Persistence::Session);
    assert_eq!(tab.get_item(ACCESS_TOKEN_KEY).as_deref(), Some(TOKEN));
    assert_eq!(durable.get_item(ACCESS_TOKEN_KEY), None);
    assert_eq!(store.get_credential(), Some(credential()));
}

#[test]
fn remembered_login_writes_both_tiers() {
    let (durable, tab, store) = tiers();
    store.store_credential(&credential(), Persistence::Remember);
    assert_eq!(durable.get_item(REFRESH_TOKEN_KEY).as_deref(), Some("refresh"));
    assert_eq!(tab.get_item(REFRESH_TOKEN_KEY).as_deref(), Some("refresh"));
}

#[test]
fn durable_tier_is_read_when_tab_tier_is_empty() {
    let (durable, _, store) = tiers();
    durable.set_item(ACCESS_TOKEN_KEY, TOKEN);
    assert_eq!(store.get_credential().map(|c| c.access_token), Some(TOKEN.to_owned()));
}

#[test]
fn malformed_token_clears_both_tiers() {
    let (durable, tab, store) = tiers();
    tab.set_item(ACCESS_TOKEN_KEY, "not-a-jwt");
    durable.set_item(ACCESS_TOKEN_KEY, TOKEN);
    storage::save_json(tab.as_ref(), USER_KEY, &user());

    assert_eq!(store.load_credential(), Err(AuthError::CredentialMalformed));
    assert!(tab.is_empty());
    assert!(durable.is_empty());
}

#[test]
fn reads_see_writes_made_after_the_store_was_created() {
    let (_, tab, store) = tiers();
    assert!(store.get_credential().is_none());
    tab.set_item(ACCESS_TOKEN_KEY, TOKEN);
    assert!(store.get_credential().is_some());
}

// =============================================================
// Cached user
// =============================================================

#[test]
fn cached_user_round_trips_every_field() {
    let (_, _, store) = tiers();
    let u = user();
    store.store_cached_user(&u);
    assert_eq!(store.get_cached_user(), Some(u));
}

#[test]
fn cached_user_is_mirrored_to_durable_tier_for_remembered_sessions() {
    let (durable, _, store) = tiers();
    store.store_credential(&credential(), Persistence::Remember);
    store.store_cached_user(&user());
    assert!(durable.get_item(USER_KEY).is_some());
}

#[test]
fn has_valid_credential_needs_token_and_user_id() {
    let (_, _, store) = tiers();
    store.store_credential(&credential(), Persistence::Session);
    assert!(!store.has_valid_credential());

    store.store_cached_user(&CachedUser { id: String::new(), ..user() });
    assert!(!store.has_valid_credential());

    store.store_cached_user(&user());
    assert!(store.has_valid_credential());
    assert_eq!(store.authenticated_user(), Some(user()));
}

#[test]
fn cached_user_without_credential_is_not_authenticated() {
    let (_, _, store) = tiers();
    store.store_cached_user(&user());
    assert!(!store.has_valid_credential());
    assert_eq!(store.authenticated_user(), None);
}

// =============================================================
// Login markers and clear
// =============================================================

#[test]
fn login_marker_round_trips() {
    let (_, _, store) = tiers();
    store.record_login(&user(), 12_345);
    assert_eq!(
        store.login_marker(),
        Some(LoginMarker { user_id: "u1".into(), role: "client".into(), timestamp_ms: 12_345 })
    );
    assert_eq!(store.role_marker().as_deref(), Some("client"));
}

#[test]
fn login_marker_with_bad_timestamp_is_ignored() {
    let (_, tab, store) = tiers();
    store.record_login(&user(), 1);
    tab.set_item(AUTH_REDIRECT_TIMESTAMP_KEY, "yesterday");
    assert_eq!(store.login_marker(), None);
}

#[test]
fn clear_removes_everything() {
    let (durable, tab, store) = tiers();
    store.store_credential(&credential(), Persistence::Remember);
    store.store_cached_user(&user());
    store.record_login(&user(), 1);
    store.clear();
    assert!(durable.is_empty());
    assert!(tab.is_empty());
    assert_eq!(store.login_marker(), None);
}
