//! Fetch capabilities used to obtain a fresh token when the cache misses.

use std::future::Future;

/// Error type a token source may fail with. It reaches the caller unchanged
/// inside [`Error::Fetch`](crate::Error::Fetch).
pub type FetchError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Produces a fresh raw token on demand.
pub trait TokenSource: Send {
    fn fetch(&mut self) -> Result<String, FetchError>;
}

impl<F> TokenSource for F
where
    F: FnMut() -> Result<String, FetchError> + Send,
{
    fn fetch(&mut self) -> Result<String, FetchError> {
        self()
    }
}

/// Async counterpart of [`TokenSource`], shared by every caller of a
/// [`SharedTokenCache`](crate::SharedTokenCache).
pub trait AsyncTokenSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<String, FetchError>> + Send;
}

impl<F, Fut> AsyncTokenSource for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, FetchError>> + Send,
{
    fn fetch(&self) -> impl Future<Output = Result<String, FetchError>> + Send {
        self()
    }
}

/// Source installed when none was configured; every fetch fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unconfigured;

impl TokenSource for Unconfigured {
    fn fetch(&mut self) -> Result<String, FetchError> {
        Err("not implemented".into())
    }
}
