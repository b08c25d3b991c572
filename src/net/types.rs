//! Wire and storage DTOs shared by the session manager.
//!
//! DESIGN
//! ======
//! Field names are camelCase on the wire and in browser storage, matching
//! the identity service's JSON, so the same value round-trips through the
//! API response, `localStorage`, and the `authSuccess` signal unchanged.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

/// Access/refresh token pair issued by the identity service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
}

/// Locally cached identity of the signed-in user.
///
/// Never authoritative on its own; it only counts alongside a stored credential.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedUser {
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Milliseconds since the epoch of the last successful identity fetch.
    #[serde(default)]
    pub last_refreshed_at: i64,
}

impl CachedUser {
    #[must_use]
    pub fn has_id(&self) -> bool {
        !self.id.trim().is_empty()
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() { self.email.clone() } else { full.to_owned() }
    }
}

/// Where a login's credential is persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persistence {
    /// Tab-scoped tier only; the session ends with the tab.
    #[default]
    Session,
    /// Tab tier plus the durable tier ("remember me").
    Remember,
}

/// Body of `POST /auth/login`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(skip)]
    pub persistence: Persistence,
}

impl LoginRequest {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into(), persistence: Persistence::Session }
    }

    #[must_use]
    pub fn remember(mut self, remember: bool) -> Self {
        self.persistence = if remember { Persistence::Remember } else { Persistence::Session };
        self
    }
}

/// Successful login response.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    pub user: CachedUser,
}

impl LoginResponse {
    #[must_use]
    pub fn credential(&self) -> Credential {
        Credential { access_token: self.access_token.clone(), refresh_token: self.refresh_token.clone() }
    }
}

/// Tab-scoped record of the most recent login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginMarker {
    pub user_id: String,
    pub role: String,
    pub timestamp_ms: i64,
}

impl LoginMarker {
    /// Minimal user record for reconciliation when no cached user is stored.
    #[must_use]
    pub fn to_user(&self) -> CachedUser {
        CachedUser { id: self.user_id.clone(), role: self.role.clone(), ..CachedUser::default() }
    }
}
