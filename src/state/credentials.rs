//! Sole read/write authority over persisted credentials.
//!
//! SYSTEM CONTEXT
//! ==============
//! Two storage tiers hold session data:
//! - durable (`localStorage`): credential + user for "remember me" sessions
//! - tab (`sessionStorage`): a mirror of both plus the login markers
//!   `authUserId`, `authUserRole` and `authRedirectTimestamp`
//!
//! Reads prefer the tab tier and fall back to the durable tier. Every call goes
//! back to storage: another tab or a concurrent refresh may have written since
//! the caller last looked, and the latest write wins.
//!
//! INVARIANTS
//! ==========
//! A structurally invalid access token is never returned. Finding one clears
//! both tiers.

#[cfg(test)]
#[path = "credentials_test.rs"]
mod credentials_test;

use std::rc::Rc;

use crate::error::AuthError;
use crate::net::types::{CachedUser, Credential, LoginMarker, Persistence};
use crate::util::storage::{self, MemoryStorage, StorageTier};
use crate::util::token;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_KEY: &str = "user";
pub const AUTH_USER_ID_KEY: &str = "authUserId";
pub const AUTH_USER_ROLE_KEY: &str = "authUserRole";
pub const AUTH_REDIRECT_TIMESTAMP_KEY: &str = "authRedirectTimestamp";

const CREDENTIAL_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY];
const MARKER_KEYS: [&str; 3] = [AUTH_USER_ID_KEY, AUTH_USER_ROLE_KEY, AUTH_REDIRECT_TIMESTAMP_KEY];

#[derive(Clone)]
pub struct CredentialStore {
    durable: Rc<dyn StorageTier>,
    tab: Rc<dyn StorageTier>,
}

impl CredentialStore {
    pub fn new(durable: Rc<dyn StorageTier>, tab: Rc<dyn StorageTier>) -> Self {
        Self { durable, tab }
    }

    /// Store backed by two fresh in-memory tiers.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Rc::new(MemoryStorage::new()), Rc::new(MemoryStorage::new()))
    }

    /// Store backed by `localStorage` and `sessionStorage`.
    #[must_use]
    pub fn browser() -> Self {
        use crate::util::storage::{BrowserStorage, TierKind};
        Self::new(Rc::new(BrowserStorage::new(TierKind::Durable)), Rc::new(BrowserStorage::new(TierKind::Tab)))
    }

    fn tiers(&self) -> [&dyn StorageTier; 2] {
        [self.tab.as_ref(), self.durable.as_ref()]
    }

    /// Typed credential lookup.
    ///
    /// # Errors
    ///
    /// `CredentialMissing` when no tier holds an access token;
    /// `CredentialMalformed` when the stored token fails the structural check
    /// (both tiers are cleared before returning).
    pub fn load_credential(&self) -> Result<Credential, AuthError> {
        for tier in self.tiers() {
            let Some(access_token) = tier.get_item(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty()) else {
                continue;
            };
            if !token::is_structurally_valid(&access_token) {
                log::warn!("discarding malformed access token; clearing stored session");
                self.clear();
                return Err(AuthError::CredentialMalformed);
            }
            let refresh_token = tier.get_item(REFRESH_TOKEN_KEY).unwrap_or_default();
            return Ok(Credential { access_token, refresh_token });
        }
        Err(AuthError::CredentialMissing)
    }

    pub fn get_credential(&self) -> Option<Credential> {
        match self.load_credential() {
            Ok(credential) => Some(credential),
            Err(e) => {
                log::debug!("no usable credential: {e}");
                None
            }
        }
    }

    /// Persist `credential` in the tab tier, and in the durable tier for
    /// remembered sessions.
    pub fn store_credential(&self, credential: &Credential, persistence: Persistence) {
        write_credential(self.tab.as_ref(), credential);
        match persistence {
            Persistence::Remember => write_credential(self.durable.as_ref(), credential),
            Persistence::Session => {
                for key in CREDENTIAL_KEYS {
                    self.durable.remove_item(key);
                }
            }
        }
    }

    pub fn get_cached_user(&self) -> Option<CachedUser> {
        self.tiers().into_iter().find_map(|tier| storage::load_json::<CachedUser>(tier, USER_KEY))
    }

    /// Persist `user` in the tab tier and, when the durable tier holds the
    /// credential, alongside it there.
    pub fn store_cached_user(&self, user: &CachedUser) {
        storage::save_json(self.tab.as_ref(), USER_KEY, user);
        if self.durable.get_item(ACCESS_TOKEN_KEY).is_some() {
            storage::save_json(self.durable.as_ref(), USER_KEY, user);
        }
    }

    /// True iff a structurally valid access token and a cached user with a
    /// non-empty id are both stored. No network I/O.
    pub fn has_valid_credential(&self) -> bool {
        self.get_credential().is_some() && self.get_cached_user().is_some_and(|u| u.has_id())
    }

    /// Stored user, but only when paired with a valid credential.
    pub fn authenticated_user(&self) -> Option<CachedUser> {
        self.get_credential()?;
        self.get_cached_user().filter(CachedUser::has_id)
    }

    /// Write the tab-scoped "just logged in" markers.
    pub fn record_login(&self, user: &CachedUser, now_ms: i64) {
        self.tab.set_item(AUTH_USER_ID_KEY, &user.id);
        self.tab.set_item(AUTH_USER_ROLE_KEY, &user.role);
        self.tab.set_item(AUTH_REDIRECT_TIMESTAMP_KEY, &now_ms.to_string());
    }

    /// The most recent login marker, if all three keys are present and sane.
    pub fn login_marker(&self) -> Option<LoginMarker> {
        let user_id = self.tab.get_item(AUTH_USER_ID_KEY).filter(|v| !v.is_empty())?;
        let role = self.tab.get_item(AUTH_USER_ROLE_KEY).filter(|v| !v.is_empty())?;
        let raw_ts = self.tab.get_item(AUTH_REDIRECT_TIMESTAMP_KEY)?;
        let Ok(timestamp_ms) = raw_ts.trim().parse::<i64>() else {
            log::debug!("ignoring unparseable login marker timestamp");
            return None;
        };
        Some(LoginMarker { user_id, role, timestamp_ms })
    }

    /// Tab-scoped role marker, read directly for the guard's fast path.
    pub fn role_marker(&self) -> Option<String> {
        self.tab.get_item(AUTH_USER_ROLE_KEY).filter(|v| !v.trim().is_empty())
    }

    /// Remove credential, user and markers from both tiers.
    pub fn clear(&self) {
        for key in CREDENTIAL_KEYS.into_iter().chain(MARKER_KEYS) {
            self.tab.remove_item(key);
            self.durable.remove_item(key);
        }
    }
}

fn write_credential(tier: &dyn StorageTier, credential: &Credential) {
    tier.set_item(ACCESS_TOKEN_KEY, &credential.access_token);
    if credential.refresh_token.is_empty() {
        tier.remove_item(REFRESH_TOKEN_KEY);
    } else {
        tier.set_item(REFRESH_TOKEN_KEY, &credential.refresh_token);
    }
}
