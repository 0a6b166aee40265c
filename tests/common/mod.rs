#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jiff::Timestamp;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use jwt_cache::FetchError;

pub const SECRET: &[u8] = b"integration-secret";

pub fn mint(alg: Algorithm, claims: serde_json::Value) -> String {
    mint_with(alg, claims, &EncodingKey::from_secret(SECRET))
}

pub fn mint_with(alg: Algorithm, claims: serde_json::Value, key: &EncodingKey) -> String {
    jsonwebtoken::encode(&Header::new(alg), &claims, key).expect("encode token")
}

/// Unsigned JWT: the given header and claims, empty signature segment.
pub fn unsecured(header: serde_json::Value, claims: serde_json::Value) -> String {
    format!(
        "{}.{}.",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string())
    )
}

pub fn at_millis(millis: i64) -> Timestamp {
    Timestamp::from_millisecond(millis).expect("timestamp in range")
}

/// Source handing out `tokens` in order (repeating the last one) and counting
/// how often it was called.
pub fn counting_source(
    tokens: Vec<String>,
) -> (
    Arc<AtomicUsize>,
    impl FnMut() -> Result<String, FetchError> + Send + 'static,
) {
    assert!(!tokens.is_empty(), "need at least one token");
    let calls = Arc::new(AtomicUsize::new(0));
    let source = {
        let calls = calls.clone();
        move || -> Result<String, FetchError> {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Ok(tokens[n.min(tokens.len() - 1)].clone())
        }
    };
    (calls, source)
}

pub fn calls(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}
