//! Session verdicts combining stored credentials with the cached user.
//!
//! DESIGN
//! ======
//! No single signal is trusted on its own: a credential without a user, or a
//! user without a credential, is not a session. The token's `exp` claim is
//! decoded only as a hint for the UI; the identity service decides whether a
//! token is still accepted.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::rc::Rc;
use std::time::Duration;

use futures::future::AbortRegistration;

use crate::error::AuthError;
use crate::net::identity::{self, IdentityRefresher};
use crate::net::types::CachedUser;
use crate::state::credentials::CredentialStore;
use crate::util::clock::Clock;
use crate::util::token;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionVerdict {
    pub is_authenticated: bool,
    pub token_exists: bool,
    /// UX hint from the decoded `exp` claim; never an authorization input.
    pub token_expired: bool,
    pub user: Option<CachedUser>,
}

#[derive(Clone)]
pub struct SessionValidator {
    store: CredentialStore,
    clock: Rc<dyn Clock>,
}

impl SessionValidator {
    pub fn new(store: CredentialStore, clock: Rc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn validate(&self) -> SessionVerdict {
        let Some(credential) = self.store.get_credential() else {
            return SessionVerdict::default();
        };
        let user = self.store.get_cached_user().filter(CachedUser::has_id);
        SessionVerdict {
            is_authenticated: user.is_some(),
            token_exists: true,
            token_expired: token::is_expired(&credential.access_token, self.clock.now_ms()),
            user,
        }
    }

    /// Silent restore used while hydrating.
    ///
    /// A complete stored session is returned as is. A credential without a
    /// cached user costs one identity fetch, raced against `timeout` and
    /// abortable through `registration`; its result is persisted.
    ///
    /// # Errors
    ///
    /// `CredentialMissing` when nothing is stored, `VerificationTimeout` when
    /// the fetch loses the race, `Cancelled` when aborted, otherwise the
    /// fetch error.
    pub async fn restore(
        &self,
        refresher: &dyn IdentityRefresher,
        timeout: Duration,
        registration: AbortRegistration,
    ) -> Result<CachedUser, AuthError> {
        let verdict = self.validate();
        if let Some(user) = verdict.user {
            return Ok(user);
        }
        if !verdict.token_exists {
            return Err(AuthError::CredentialMissing);
        }

        let mut user = identity::refresh_with_timeout(refresher, self.clock.as_ref(), timeout, registration)
            .await
            .into_result(timeout)?;
        // Another tab may have logged out while the fetch was in flight.
        if self.store.get_credential().is_none() {
            log::info!("credential cleared during restore; discarding fetched identity");
            return Err(AuthError::CredentialMissing);
        }
        user.last_refreshed_at = self.clock.now_ms();
        self.store.store_cached_user(&user);
        Ok(user)
    }
}
