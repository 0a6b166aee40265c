
use jsonwebtoken::{Algorithm, DecodingKey};
use serde_json::json;

use crate::{Error, FetchError, ManualClock, TokenCache, TokenCacheBuilder, TokenSource};

use test_support::{LogCapture, SECRET, mint};

fn fixed(token: String) -> impl FnMut() -> Result<String, FetchError> + Send {
    move || Ok(token.clone())
}

fn logged(name: &str, logs: &LogCapture, source: impl TokenSource + 'static) -> TokenCache {
    TokenCacheBuilder::default()
        .name(name)
        .logger(logs.dispatch())
        .clock(ManualClock::at_second(1_000))
        .token_source(source)
        .build()
}

#[test]
fn explicit_logger_receives_cache_events() {
    let logs = LogCapture::default();
    let mut cache = logged(
        "orders-api",
        &logs,
        fixed(mint(Algorithm::HS256, json!({ "sub": "svc" }))),
    );

    cache.retrieve_token().expect("token");

    assert!(
        logs.has_line(&[
            "INFO",
            "token.not_cached",
            "cache=orders-api",
            "exp claim not set"
        ]),
        "logs: {:?}",
        logs.lines()
    );
    assert!(logs.has_line(&["DEBUG", "fetch.start", "attempt_id="]));
}

#[test]
fn out_of_range_expiry_logs_its_own_reason() {
    let logs = LogCapture::default();
    let mut cache = logged(
        "far-future",
        &logs,
        fixed(mint(Algorithm::HS256, json!({ "exp": i64::MAX }))),
    );

    cache.retrieve_token().expect("token");

    assert!(cache.valid_until().is_none());
    assert!(logs.has_line(&["INFO", "token.not_cached", "exp claim out of range"]));
    assert!(!logs.has_line(&["exp claim not set"]));
}

#[test]
fn parse_failure_is_logged_at_debug() {
    let logs = LogCapture::default();
    let mut cache = logged("opaque", &logs, fixed("opaque-token".into()));

    assert_eq!(cache.retrieve_token().expect("still returned"), "opaque-token");
    assert!(logs.has_line(&["DEBUG", "token.parse_failed", "cache=opaque"]));
}

#[test]
fn caching_duration_is_logged() {
    let logs = LogCapture::default();
    let mut cache = logged(
        "timed",
        &logs,
        fixed(mint(Algorithm::HS256, json!({ "iat": 1_000, "exp": 1_100 }))),
    );

    cache.retrieve_token().expect("token");
    assert!(logs.has_line(&["DEBUG", "token.cached", "lifetime="]));
}

#[test]
fn caching_instant_is_logged_without_iat() {
    let logs = LogCapture::default();
    let mut cache = logged(
        "",
        &logs,
        fixed(mint(Algorithm::HS256, json!({ "exp": 1_100 }))),
    );

    cache.retrieve_token().expect("token");
    // 1100 - 2 * headroom(1s)
    assert!(logs.has_line(&["DEBUG", "token.cached", "until=1970-01-01T00:18:18Z"]));
}

#[test]
fn verification_failure_is_logged_and_returned() {
    let logs = LogCapture::default();
    let mut cache = logged(
        "strict",
        &logs,
        fixed(mint(Algorithm::HS256, json!({ "exp": 1_100 }))),
    );

    let result = cache.retrieve_verified_token(&DecodingKey::from_secret(b"wrong"), "HS256");

    assert!(matches!(result, Err(Error::Verification(_))));
    assert!(logs.has_line(&["DEBUG", "token.verification_failed", "cache=strict"]));
}

#[test]
fn fetch_failure_is_logged_and_passed_through() {
    let logs = LogCapture::default();
    let mut cache = logged("down", &logs, || -> Result<String, FetchError> {
        Err("issuer unavailable".into())
    });

    let err = cache.retrieve_token().expect_err("fails");
    assert!(matches!(err, Error::Fetch(_)));
    assert_eq!(err.to_string(), "issuer unavailable");
    assert!(logs.has_line(&[
        "WARN",
        "fetch.failure",
        "cache=down",
        "attempt_id=",
        "issuer unavailable"
    ]));
}

#[test]
fn verified_path_accepts_own_secret() {
    let mut cache = TokenCache::builder()
        .clock(ManualClock::at_second(1_000))
        .token_source(fixed(mint(Algorithm::HS256, json!({ "exp": 1_100 }))))
        .build();
    cache
        .retrieve_verified_token(&DecodingKey::from_secret(SECRET), "HS256")
        .expect("verifies");
    assert_eq!(cache.valid_until().map(|t| t.as_second()), Some(1_099));
}
