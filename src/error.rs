//! Error taxonomy for session and route-access handling.
//!
//! ERROR HANDLING
//! ==============
//! Storage and network failures are reduced to these variants at the
//! `CredentialStore`, `SessionValidator` and `IdentityRefresher` boundaries.
//! The route guard never renders them; it only logs them and turns them into
//! a render/loading/redirect outcome.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use crate::util::roles::Section;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("no stored credential")]
    CredentialMissing,
    #[error("stored access token is malformed")]
    CredentialMalformed,
    #[error("identity service rejected the session")]
    NotAuthenticated,
    #[error("login rejected: invalid email or password")]
    InvalidLogin,
    #[error("identity service unavailable: {0}")]
    RemoteUnavailable(String),
    #[error("verification budget exhausted after {attempts} attempts")]
    VerificationExhausted { attempts: u8 },
    #[error("identity verification timed out after {timeout_ms}ms")]
    VerificationTimeout { timeout_ms: u64 },
    #[error("role {role:?} may not enter the {section} section")]
    RoleMismatch { role: String, section: Section },
    #[error("request cancelled")]
    Cancelled,
    #[error("decode error: {0}")]
    Decode(String),
}

/// Copyable classification of an [`AuthError`], stored in `AuthState::last_errors`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CredentialMissing,
    CredentialMalformed,
    NotAuthenticated,
    InvalidLogin,
    RemoteUnavailable,
    VerificationExhausted,
    VerificationTimeout,
    RoleMismatch,
    Cancelled,
    Decode,
}

impl AuthError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CredentialMissing => ErrorKind::CredentialMissing,
            Self::CredentialMalformed => ErrorKind::CredentialMalformed,
            Self::NotAuthenticated => ErrorKind::NotAuthenticated,
            Self::InvalidLogin => ErrorKind::InvalidLogin,
            Self::RemoteUnavailable(_) => ErrorKind::RemoteUnavailable,
            Self::VerificationExhausted { .. } => ErrorKind::VerificationExhausted,
            Self::VerificationTimeout { .. } => ErrorKind::VerificationTimeout,
            Self::RoleMismatch { .. } => ErrorKind::RoleMismatch,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Decode(_) => ErrorKind::Decode,
        }
    }

    /// Whether this outcome counts against the guard's verification budget.
    ///
    /// Cancellation is neutral: the visitor navigated away, so nothing was learned.
    #[must_use]
    pub fn is_verification_failure(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
