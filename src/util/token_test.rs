use super::*;

fn token_with_payload(json: &str) -> String {
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    format!("{}.{}.sig", engine.encode(br#"{"alg":"HS256"}"#), engine.encode(json.as_bytes()))
}

#[test]
fn three_segments_are_structurally_valid() {
    assert!(is_structurally_valid("a.b.c"));
}

#[test]
fn wrong_segment_counts_are_invalid() {
    assert!(!is_structurally_valid(""));
    assert!(!is_structurally_valid("a.b"));
    assert!(!is_structurally_valid("a.b.c.d"));
    assert!(!is_structurally_valid("not-a-jwt"));
}

#[test]
fn empty_segments_are_invalid() {
    assert!(!is_structurally_valid("a..c"));
    assert!(!is_structurally_valid(".b.c"));
}

#[test]
fn decode_expiry_reads_exp_claim() {
    let token = token_with_payload(r#"{"sub":"u1","exp":1700000000}"#);
    assert_eq!(decode_expiry(&token), Ok(Some(1_700_000_000)));
}

#[test]
fn decode_expiry_without_claim_is_none() {
    let token = token_with_payload(r#"{"sub":"u1"}"#);
    assert_eq!(decode_expiry(&token), Ok(None));
}

#[test]
fn decode_expiry_rejects_garbage_payload() {
    assert_eq!(decode_expiry("a.b.c").map_err(|e| e.kind()), Err(crate::error::ErrorKind::Decode));
    assert_eq!(decode_expiry("a.b"), Err(AuthError::CredentialMalformed));
}

#[test]
fn is_expired_compares_against_milliseconds() {
    let token = token_with_payload(r#"{"exp":100}"#);
    assert!(is_expired(&token, 100_000));
    assert!(!is_expired(&token, 99_999));
}

#[test]
fn undecodable_tokens_are_not_reported_expired() {
    assert!(!is_expired("a.b.c", i64::MAX));
}
