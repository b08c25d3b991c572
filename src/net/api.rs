//! REST client for the identity service.
//!
//! Client-side (hydrate): real HTTP calls via `gloo-net`, bearer token taken
//! from the credential store at call time.
//! Server-side (SSR) and native tests: every call fails with
//! `RemoteUnavailable` without touching the network.
//!
//! ERROR HANDLING
//! ==============
//! 401/403 map to `NotAuthenticated` (or `InvalidLogin` on the login call);
//! every other failure maps to `RemoteUnavailable` so callers can tell a
//! rejected session from a flaky network.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::error::AuthError;
use crate::net::identity::{AuthApi, IdentityRefresher};
use crate::net::types::{CachedUser, LoginRequest, LoginResponse};
use crate::state::credentials::CredentialStore;

fn endpoint(api_base: &str, path: &str) -> String {
    format!("{}/{}", api_base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(any(test, feature = "hydrate"))]
fn bearer(access_token: &str) -> String {
    format!("Bearer {access_token}")
}

/// Classify a non-2xx status from an authenticated call.
#[cfg(any(test, feature = "hydrate"))]
fn status_error(status: u16) -> AuthError {
    match status {
        401 | 403 => AuthError::NotAuthenticated,
        _ => AuthError::RemoteUnavailable(format!("identity service returned {status}")),
    }
}

/// Classify a non-2xx status from the login call.
#[cfg(any(test, feature = "hydrate"))]
fn login_status_error(status: u16) -> AuthError {
    match status {
        400 | 401 | 403 => AuthError::InvalidLogin,
        _ => status_error(status),
    }
}

/// `gloo-net` backed [`AuthApi`].
#[derive(Clone)]
pub struct HttpAuthApi {
    api_base: String,
    store: CredentialStore,
}

impl HttpAuthApi {
    pub fn new(api_base: impl Into<String>, store: CredentialStore) -> Self {
        Self { api_base: api_base.into(), store }
    }

    #[must_use]
    pub fn me_url(&self) -> String {
        endpoint(&self.api_base, "auth/me")
    }

    #[must_use]
    pub fn login_url(&self) -> String {
        endpoint(&self.api_base, "auth/login")
    }

    #[must_use]
    pub fn logout_url(&self) -> String {
        endpoint(&self.api_base, "auth/logout")
    }

    async fn fetch_me(&self) -> Result<CachedUser, AuthError> {
        let credential = self.store.load_credential()?;
        #[cfg(feature = "hydrate")]
        {
            let resp = gloo_net::http::Request::get(&self.me_url())
                .header("Authorization", &bearer(&credential.access_token))
                .send()
                .await
                .map_err(|e| AuthError::RemoteUnavailable(e.to_string()))?;
            if !resp.ok() {
                return Err(status_error(resp.status()));
            }
            resp.json::<CachedUser>().await.map_err(|e| AuthError::Decode(e.to_string()))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = credential;
            Err(AuthError::RemoteUnavailable("not available on server".to_owned()))
        }
    }

    async fn post_login(&self, request: &LoginRequest) -> Result<LoginResponse, AuthError> {
        #[cfg(feature = "hydrate")]
        {
            let resp = gloo_net::http::Request::post(&self.login_url())
                .json(request)
                .map_err(|e| AuthError::Decode(e.to_string()))?
                .send()
                .await
                .map_err(|e| AuthError::RemoteUnavailable(e.to_string()))?;
            if !resp.ok() {
                return Err(login_status_error(resp.status()));
            }
            resp.json::<LoginResponse>().await.map_err(|e| AuthError::Decode(e.to_string()))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = request;
            Err(AuthError::RemoteUnavailable("not available on server".to_owned()))
        }
    }

    async fn post_logout(&self) -> Result<(), AuthError> {
        let credential = self.store.load_credential()?;
        #[cfg(feature = "hydrate")]
        {
            let resp = gloo_net::http::Request::post(&self.logout_url())
                .header("Authorization", &bearer(&credential.access_token))
                .send()
                .await
                .map_err(|e| AuthError::RemoteUnavailable(e.to_string()))?;
            if !resp.ok() {
                return Err(status_error(resp.status()));
            }
            Ok(())
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = credential;
            Err(AuthError::RemoteUnavailable("not available on server".to_owned()))
        }
    }
}

impl IdentityRefresher for HttpAuthApi {
    fn fetch_current_identity(&self) -> LocalBoxFuture<'_, Result<CachedUser, AuthError>> {
        self.fetch_me().boxed_local()
    }
}

impl AuthApi for HttpAuthApi {
    fn login<'a>(&'a self, request: &'a LoginRequest) -> LocalBoxFuture<'a, Result<LoginResponse, AuthError>> {
        self.post_login(request).boxed_local()
    }

    fn logout(&self) -> LocalBoxFuture<'_, Result<(), AuthError>> {
        self.post_logout().boxed_local()
    }
}
