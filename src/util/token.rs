//! Local inspection of the access token.
//!
//! Only structure and the `exp` claim are looked at. Signatures are never
//! checked here; the identity service stays authoritative and rejects stale
//! tokens with a 401-class response.

#[cfg(test)]
#[path = "token_test.rs"]
mod token_test;

use base64::Engine as _;
use serde::Deserialize;

use crate::error::AuthError;

#[derive(Debug, Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// Whether `token` has exactly three non-empty dot-separated segments.
#[must_use]
pub fn is_structurally_valid(token: &str) -> bool {
    let segments: Vec<&str> = token.split('.').collect();
    segments.len() == 3 && segments.iter().all(|s| !s.is_empty())
}

/// Decode the `exp` claim (seconds since the epoch) from the token payload.
///
/// # Errors
///
/// Returns `CredentialMalformed` for structurally invalid tokens and `Decode`
/// when the payload is not base64url-encoded JSON.
pub fn decode_expiry(token: &str) -> Result<Option<i64>, AuthError> {
    if !is_structurally_valid(token) {
        return Err(AuthError::CredentialMalformed);
    }
    let payload = token.split('.').nth(1).unwrap_or_default().trim_end_matches('=');
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| AuthError::Decode(e.to_string()))?;
    let claims: Claims = serde_json::from_slice(&bytes)?;
    Ok(claims.exp)
}

/// UX hint: whether the token's `exp` claim lies at or before `now_ms`.
///
/// Tokens without a decodable expiry are reported as not expired.
#[must_use]
pub fn is_expired(token: &str, now_ms: i64) -> bool {
    match decode_expiry(token) {
        Ok(Some(exp)) => exp.saturating_mul(1000) <= now_ms,
        Ok(None) | Err(_) => false,
    }
}
