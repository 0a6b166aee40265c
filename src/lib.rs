//! Single-slot cache for a bearer JWT.
//!
//! A [`TokenCache`] keeps the last fetched token until shortly before its
//! `exp` claim and calls the configured [`TokenSource`] only when the cached
//! token is missing or stale. [`SharedTokenCache`] does the same for
//! concurrent callers and collapses simultaneous misses into a single fetch.

mod cache;
pub mod claims;
pub mod clock;
pub mod config;
pub mod errors;
mod shared;
mod slot;
pub mod source;
mod telemetry;

pub use cache::{TokenCache, TokenCacheBuilder};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use errors::Error;
pub use shared::SharedTokenCache;
pub use source::{AsyncTokenSource, FetchError, TokenSource, Unconfigured};

#[cfg(test)]
mod tests;
