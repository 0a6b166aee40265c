//! Structured diagnostics emitted by the caches.

mod cache;

pub(crate) use cache::CacheTelemetry;
