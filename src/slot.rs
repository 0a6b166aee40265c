//! Cache state shared by [`TokenCache`](crate::TokenCache) and
//! [`SharedTokenCache`](crate::SharedTokenCache): the cached token, how long
//! it stays valid, and the update applied after every successful fetch.

use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};
use jsonwebtoken::{Algorithm, DecodingKey};

use crate::claims::{self, NumericClaims};
use crate::clock::Clock;
use crate::errors::Error;
use crate::telemetry::CacheTelemetry;

/// Raw token plus the instant it stops being served. Always replaced as a unit.
#[derive(Clone, Debug)]
struct CachedToken {
    raw: String,
    valid_until: Timestamp,
}

pub(crate) struct Slot {
    entry: Option<CachedToken>,
    headroom: SignedDuration,
    clock: Arc<dyn Clock>,
    telemetry: CacheTelemetry,
}

impl Slot {
    pub fn new(
        headroom: SignedDuration,
        clock: Arc<dyn Clock>,
        telemetry: CacheTelemetry,
    ) -> Self {
        Self {
            entry: None,
            headroom,
            clock,
            telemetry,
        }
    }

    pub fn telemetry(&self) -> &CacheTelemetry {
        &self.telemetry
    }

    pub fn headroom(&self) -> SignedDuration {
        self.headroom
    }

    pub fn valid_until(&self) -> Option<Timestamp> {
        self.entry.as_ref().map(|entry| entry.valid_until)
    }

    /// The cached token, if there is one and `now` is strictly before its
    /// validity instant.
    pub fn cached(&self) -> Option<&str> {
        let entry = self.entry.as_ref()?;
        (self.clock.now() < entry.valid_until).then_some(entry.raw.as_str())
    }

    /// Takes a freshly fetched token without checking its signature. A token
    /// whose claims cannot be read is still handed back; it just isn't cached.
    pub fn accept_unverified(&mut self, raw: String) -> String {
        match claims::decode_unverified(&raw) {
            Ok(claims) => self.update(&raw, claims),
            Err(err) => self.telemetry.emit_parse_failed(&err),
        }
        raw
    }

    /// Takes a freshly fetched token only if it verifies under `key` and
    /// `algorithm`. Rejected tokens are dropped.
    pub fn accept_verified(
        &mut self,
        raw: String,
        key: &DecodingKey,
        algorithm: Algorithm,
    ) -> Result<String, Error> {
        match claims::decode_verified(&raw, key, algorithm, self.clock.now()) {
            Ok(claims) => {
                self.update(&raw, claims);
                Ok(raw)
            }
            Err(err) => {
                self.telemetry.emit_verification_failed(&err);
                Err(err)
            }
        }
    }

    fn update(&mut self, raw: &str, claims: NumericClaims) {
        let Some(valid_until) = cache_window(&claims, self.headroom) else {
            self.entry = None;
            self.telemetry.emit_not_cached(match claims.expires_at() {
                0 => "exp claim not set",
                _ => "exp claim out of range",
            });
            return;
        };
        self.entry = Some(CachedToken {
            raw: raw.to_owned(),
            valid_until,
        });

        let issued = match claims.issued_at() {
            0 => None,
            iat => Timestamp::from_second(iat)
                .and_then(|at| at.checked_sub(self.headroom))
                .ok(),
        };
        match issued {
            Some(issued) => self
                .telemetry
                .emit_cached_for(valid_until.duration_since(issued)),
            None => self.telemetry.emit_cached_until(
                valid_until
                    .checked_sub(self.headroom)
                    .unwrap_or(valid_until),
            ),
        }
    }
}

/// `exp - headroom`, or `None` when the token has no usable expiry.
pub(crate) fn cache_window(
    claims: &NumericClaims,
    headroom: SignedDuration,
) -> Option<Timestamp> {
    match claims.expires_at() {
        0 => None,
        exp => Timestamp::from_second(exp)
            .and_then(|at| at.checked_sub(headroom))
            .ok(),
    }
}
