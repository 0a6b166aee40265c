use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use jiff::{SignedDuration, Timestamp};
use jsonwebtoken::{Algorithm, DecodingKey};
use tracing::Dispatch;

use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::errors::Error;
use crate::shared::SharedTokenCache;
use crate::slot::Slot;
use crate::source::{AsyncTokenSource, TokenSource, Unconfigured};
use crate::telemetry::CacheTelemetry;

/// Options for building a [`TokenCache`] or [`SharedTokenCache`].
///
/// Setters may be called in any order and any number of times; the last call
/// for a field wins.
pub struct TokenCacheBuilder {
    name: String,
    headroom: Duration,
    logger: Option<Dispatch>,
    source: Box<dyn TokenSource>,
    clock: Arc<dyn Clock>,
}

impl Default for TokenCacheBuilder {
    fn default() -> Self {
        Self {
            name: String::new(),
            headroom: Duration::from_secs(1),
            logger: None,
            source: Box::new(Unconfigured),
            clock: Arc::new(SystemClock),
        }
    }
}

impl TokenCacheBuilder {
    /// Label used in diagnostics. Defaults to empty.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// How much earlier than `exp` a cached token counts as expired.
    /// Defaults to one second.
    pub fn headroom(mut self, headroom: Duration) -> Self {
        self.headroom = headroom;
        self
    }

    /// Routes this cache's events to `dispatch` instead of the global
    /// `tracing` subscriber.
    pub fn logger(mut self, dispatch: Dispatch) -> Self {
        self.logger = Some(dispatch);
        self
    }

    /// Called whenever a fresh token is needed. Without one every fetch
    /// fails with "not implemented".
    pub fn token_source(mut self, source: impl TokenSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Applies the name and headroom of a loaded [`CacheConfig`].
    pub fn config(self, config: &CacheConfig) -> Self {
        self.name(config.name.clone()).headroom(config.headroom())
    }

    pub fn build(self) -> TokenCache {
        let (slot, source) = self.into_parts();
        TokenCache { slot, source }
    }

    /// Builds the synchronized flavour. `source` replaces any source set with
    /// [`token_source`](Self::token_source).
    pub fn build_shared<S: AsyncTokenSource>(self, source: S) -> SharedTokenCache<S> {
        let (slot, _) = self.into_parts();
        SharedTokenCache::new(slot, source)
    }

    fn into_parts(self) -> (Slot, Box<dyn TokenSource>) {
        let headroom = SignedDuration::try_from(self.headroom).unwrap_or(SignedDuration::MAX);
        let telemetry = CacheTelemetry::new(self.name, self.logger);
        (Slot::new(headroom, self.clock, telemetry), self.source)
    }
}

/// Single-slot cache for a bearer JWT.
///
/// The cached token is served until `exp - headroom`; after that the next
/// retrieval calls the token source again. Tokens without an `exp` claim are
/// never cached.
pub struct TokenCache {
    slot: Slot,
    source: Box<dyn TokenSource>,
}

impl TokenCache {
    pub fn builder() -> TokenCacheBuilder {
        TokenCacheBuilder::default()
    }

    /// A cache with default settings around `source`.
    pub fn new(source: impl TokenSource + 'static) -> Self {
        Self::builder().token_source(source).build()
    }

    pub fn name(&self) -> &str {
        self.slot.telemetry().name()
    }

    pub fn headroom(&self) -> SignedDuration {
        self.slot.headroom()
    }

    /// Instant the cached token stops being served, if one is cached.
    pub fn valid_until(&self) -> Option<Timestamp> {
        self.slot.valid_until()
    }

    /// Returns the cached token while it is valid, otherwise fetches a new
    /// one. Fetch errors are passed through. The fetched token is returned
    /// even if its claims cannot be parsed; it is then not cached.
    pub fn retrieve_token(&mut self) -> Result<String, Error> {
        if let Some(token) = self.slot.cached() {
            return Ok(token.to_owned());
        }
        let raw = self.fetch()?;
        Ok(self.slot.accept_unverified(raw))
    }

    /// Like [`retrieve_token`](Self::retrieve_token), but a fetched token is
    /// only returned (and cached) if its signature verifies with `key` under
    /// the algorithm named by `algorithm` (e.g. `"HS256"`, `"RS256"`).
    pub fn retrieve_verified_token(
        &mut self,
        key: &DecodingKey,
        algorithm: &str,
    ) -> Result<String, Error> {
        let algorithm = resolve_algorithm(algorithm)?;
        if let Some(token) = self.slot.cached() {
            return Ok(token.to_owned());
        }
        let raw = self.fetch()?;
        self.slot.accept_verified(raw, key, algorithm)
    }

    fn fetch(&mut self) -> Result<String, Error> {
        let telemetry = self.slot.telemetry();
        let attempt_id = telemetry.emit_fetch_start();
        let raw = self
            .source
            .fetch()
            .inspect_err(|err| telemetry.emit_fetch_failure(attempt_id, err))?;
        Ok(raw)
    }
}

pub(crate) fn resolve_algorithm(name: &str) -> Result<Algorithm, Error> {
    Algorithm::from_str(name).map_err(|_| Error::UnknownAlgorithm(name.to_owned()))
}
