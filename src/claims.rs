//! Registered numeric-date claims and the two ways of reading them out of a
//! raw token: decode-only, or signature-checked.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jiff::Timestamp;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::errors::Error;

/// NumericDate claims (RFC 7519 §2: seconds since the Unix epoch, UTC).
/// An absent or `null` claim reads as zero.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct NumericClaims {
    #[serde(default)]
    iat: Option<i64>,
    #[serde(default)]
    exp: Option<i64>,
    #[serde(default)]
    nbf: Option<i64>,
}

impl NumericClaims {
    pub fn new(iat: i64, exp: i64) -> Self {
        Self {
            iat: Some(iat),
            exp: Some(exp),
            nbf: None,
        }
    }

    pub fn issued_at(&self) -> i64 {
        self.iat.unwrap_or(0)
    }

    pub fn expires_at(&self) -> i64 {
        self.exp.unwrap_or(0)
    }

    pub fn not_before(&self) -> i64 {
        self.nbf.unwrap_or(0)
    }

    /// Checks `exp`, `iat` and `nbf` against `now` without leeway. Zero
    /// claims are skipped.
    pub fn validate_times(&self, now: Timestamp) -> Result<(), Error> {
        let now = now.as_second();
        let exp = self.expires_at();
        if exp != 0 && now > exp {
            return Err(Error::InvalidClaims(format!(
                "token is expired by {}s",
                now - exp
            )));
        }
        let iat = self.issued_at();
        if iat != 0 && now < iat {
            return Err(Error::InvalidClaims("token used before issued".into()));
        }
        let nbf = self.not_before();
        if nbf != 0 && now < nbf {
            return Err(Error::InvalidClaims("token is not valid yet".into()));
        }
        Ok(())
    }
}

/// Reads the claims without looking at the signature or the header's `alg`,
/// so unsecured (`alg: none`) tokens decode as well.
pub fn decode_unverified(token: &str) -> Result<NumericClaims, Error> {
    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(Error::MalformedToken(
            "token contains an invalid number of segments".into(),
        ));
    };

    let header = decode_segment(header, "header")?;
    serde_json::from_slice::<serde_json::Map<String, serde_json::Value>>(&header)
        .map_err(|e| Error::MalformedToken(format!("header is not a JSON object: {e}")))?;

    serde_json::from_slice(&decode_segment(payload, "payload")?)
        .map_err(|e| Error::MalformedToken(format!("invalid claims: {e}")))
}

fn decode_segment(segment: &str, part: &str) -> Result<Vec<u8>, Error> {
    URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| Error::MalformedToken(format!("{part} is not base64url: {e}")))
}

/// Verifies `token` was signed with `algorithm` under `key` and that its time
/// claims hold at `now`.
///
/// The header's declared algorithm is compared against `algorithm` before the
/// signature is looked at, so a token cannot pick the algorithm it is checked
/// with (for example an HMAC token keyed with an RSA public key).
pub fn decode_verified(
    token: &str,
    key: &DecodingKey,
    algorithm: Algorithm,
    now: Timestamp,
) -> Result<NumericClaims, Error> {
    let header = jsonwebtoken::decode_header(token)?;
    if header.alg != algorithm {
        return Err(Error::UnexpectedAlgorithm {
            expected: algorithm,
            found: header.alg,
        });
    }

    let mut validation = Validation::new(algorithm);
    relax_registered_claims(&mut validation);
    let data = jsonwebtoken::decode::<NumericClaims>(token, key, &validation)?;
    data.claims.validate_times(now)?;
    Ok(data.claims)
}

// Time claims are checked against the cache clock instead, and `exp` is optional.
fn relax_registered_claims(validation: &mut Validation) {
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.leeway = 0;
}
