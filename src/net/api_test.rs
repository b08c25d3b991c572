use super::*;

#[test]
fn endpoint_joins_without_double_slashes() {
    assert_eq!(endpoint("/api/", "/auth/me"), "/api/auth/me");
    assert_eq!(endpoint("https://id.example.com", "auth/login"), "https://id.example.com/auth/login");
}

#[test]
fn bearer_formats_authorization_header() {
    assert_eq!(bearer("a.b.c"), "Bearer a.b.c");
}

#[test]
fn unauthorized_statuses_map_to_not_authenticated() {
    assert_eq!(status_error(401), AuthError::NotAuthenticated);
    assert_eq!(status_error(403), AuthError::NotAuthenticated);
}

#[test]
fn server_errors_map_to_remote_unavailable() {
    assert_eq!(
        status_error(503),
        AuthError::RemoteUnavailable("identity service returned 503".to_owned())
    );
}

#[test]
fn login_rejections_map_to_invalid_login() {
    assert_eq!(login_status_error(400), AuthError::InvalidLogin);
    assert_eq!(login_status_error(401), AuthError::InvalidLogin);
    assert_eq!(login_status_error(500).kind(), crate::error::ErrorKind::RemoteUnavailable);
}

#[test]
fn urls_derive_from_api_base() {
    let api = HttpAuthApi::new("/api", CredentialStore::in_memory());
    assert_eq!(api.me_url(), "/api/auth/me");
    assert_eq!(api.login_url(), "/api/auth/login");
    assert_eq!(api.logout_url(), "/api/auth/logout");
}

#[cfg(not(feature = "hydrate"))]
#[tokio::test]
async fn fetch_without_credential_reports_missing() {
    let api = HttpAuthApi::new("/api", CredentialStore::in_memory());
    assert_eq!(api.fetch_current_identity().await, Err(AuthError::CredentialMissing));
}

#[cfg(not(feature = "hydrate"))]
#[tokio::test]
async fn server_builds_never_reach_the_network() {
    let api = HttpAuthApi::new("/api", CredentialStore::in_memory());
    let err = api.login(&LoginRequest::new("a@b.com", "pw")).await.unwrap_err();
    assert_eq!(err.kind(), crate::error::ErrorKind::RemoteUnavailable);
}
