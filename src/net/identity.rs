//! Remote identity seams and the bounded, cancellable verification race.
//!
//! SYSTEM CONTEXT
//! ==============
//! Fetching the current identity is the only remote call the route guard
//! makes. It is raced against the verification timeout and wrapped in an
//! abort handle so navigation can cancel it. Cancellation is reported
//! separately from rejection: only a rejection or a timeout spends the guard's
//! verification budget.

#[cfg(test)]
#[path = "identity_test.rs"]
mod identity_test;

use std::time::Duration;

use futures::future::{self, AbortHandle, AbortRegistration, Abortable, Either, LocalBoxFuture};

use crate::error::AuthError;
use crate::net::types::{CachedUser, LoginRequest, LoginResponse};
use crate::util::clock::Clock;

/// Fetch-current-identity against the remote service.
pub trait IdentityRefresher {
    fn fetch_current_identity(&self) -> LocalBoxFuture<'_, Result<CachedUser, AuthError>>;
}

/// Full remote surface used by `AuthStore`.
pub trait AuthApi: IdentityRefresher {
    fn login<'a>(&'a self, request: &'a LoginRequest) -> LocalBoxFuture<'a, Result<LoginResponse, AuthError>>;
    fn logout(&self) -> LocalBoxFuture<'_, Result<(), AuthError>>;
}

/// Result of one raced identity fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed(CachedUser),
    Rejected(AuthError),
    TimedOut,
    Cancelled,
}

impl RefreshOutcome {
    /// Error view of the non-success outcomes.
    #[must_use]
    pub fn error(&self, timeout: Duration) -> Option<AuthError> {
        match self {
            Self::Refreshed(_) => None,
            Self::Rejected(e) => Some(e.clone()),
            Self::TimedOut => Some(AuthError::VerificationTimeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
            Self::Cancelled => Some(AuthError::Cancelled),
        }
    }

    /// Collapse into the fetch result, timeouts becoming `VerificationTimeout`.
    ///
    /// # Errors
    ///
    /// Every outcome other than `Refreshed`.
    pub fn into_result(self, timeout: Duration) -> Result<CachedUser, AuthError> {
        match self {
            Self::Refreshed(user) => Ok(user),
            other => Err(other.error(timeout).unwrap_or(AuthError::Cancelled)),
        }
    }
}

/// Handle pair for one cancellable fetch.
#[must_use]
pub fn abort_pair() -> (AbortHandle, AbortRegistration) {
    AbortHandle::new_pair()
}

/// Fetch the identity, racing the remote call against `timeout`.
///
/// Aborting the registration's handle resolves the race as `Cancelled`.
pub async fn refresh_with_timeout(
    refresher: &dyn IdentityRefresher,
    clock: &dyn Clock,
    timeout: Duration,
    registration: AbortRegistration,
) -> RefreshOutcome {
    let fetch = Abortable::new(refresher.fetch_current_identity(), registration);
    let deadline = clock.sleep(timeout);

    match future::select(fetch, deadline).await {
        Either::Left((Ok(Ok(user)), _)) => RefreshOutcome::Refreshed(user),
        Either::Left((Ok(Err(AuthError::Cancelled)) | Err(_), _)) => RefreshOutcome::Cancelled,
        Either::Left((Ok(Err(e)), _)) => RefreshOutcome::Rejected(e),
        Either::Right(((), _)) => RefreshOutcome::TimedOut,
    }
}
