use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::{Mutex, RwLock};

use crate::cache::resolve_algorithm;
use crate::errors::Error;
use crate::slot::Slot;
use crate::source::AsyncTokenSource;

/// Token cache safe to share between tasks.
///
/// Retrievals that miss the cache queue behind a single refresh lock, so a
/// burst of concurrent misses performs one fetch; the callers behind it are
/// served from the refreshed cache. Built with
/// [`TokenCacheBuilder::build_shared`](crate::TokenCacheBuilder::build_shared).
pub struct SharedTokenCache<S> {
    slot: RwLock<Slot>,
    refresh_lock: Mutex<()>,
    source: S,
}

impl<S: AsyncTokenSource> SharedTokenCache<S> {
    pub(crate) fn new(slot: Slot, source: S) -> Self {
        Self {
            slot: RwLock::new(slot),
            refresh_lock: Mutex::new(()),
            source,
        }
    }

    pub async fn valid_until(&self) -> Option<jiff::Timestamp> {
        self.slot.read().await.valid_until()
    }

    /// Async, coalescing form of
    /// [`TokenCache::retrieve_token`](crate::TokenCache::retrieve_token).
    pub async fn retrieve_token(&self) -> Result<String, Error> {
        self.retrieve(None).await
    }

    /// Async, coalescing form of
    /// [`TokenCache::retrieve_verified_token`](crate::TokenCache::retrieve_verified_token).
    pub async fn retrieve_verified_token(
        &self,
        key: &DecodingKey,
        algorithm: &str,
    ) -> Result<String, Error> {
        let algorithm = resolve_algorithm(algorithm)?;
        self.retrieve(Some((key, algorithm))).await
    }

    async fn retrieve(&self, verify: Option<(&DecodingKey, Algorithm)>) -> Result<String, Error> {
        if let Some(token) = self.cached().await {
            return Ok(token);
        }

        // Only one fetch should run at a time.
        let _lock = self.refresh_lock.lock().await;
        if let Some(token) = self.cached().await {
            return Ok(token);
        }

        let telemetry = self.slot.read().await.telemetry().clone();
        let attempt_id = telemetry.emit_fetch_start();
        let raw = self
            .source
            .fetch()
            .await
            .inspect_err(|err| telemetry.emit_fetch_failure(attempt_id, err))?;

        let mut slot = self.slot.write().await;
        match verify {
            Some((key, algorithm)) => slot.accept_verified(raw, key, algorithm),
            None => Ok(slot.accept_unverified(raw)),
        }
    }

    async fn cached(&self) -> Option<String> {
        self.slot.read().await.cached().map(str::to_owned)
    }
}
