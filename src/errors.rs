use jsonwebtoken::Algorithm;

use crate::source::FetchError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failure reported by the token source, passed through as-is.
    #[error("{0}")]
    Fetch(FetchError),
    #[error("unknown signing method: {0}")]
    UnknownAlgorithm(String),
    #[error("unexpected signing method: {found:?} (expected {expected:?})")]
    UnexpectedAlgorithm {
        expected: Algorithm,
        found: Algorithm,
    },
    #[error("malformed token: {0}")]
    MalformedToken(String),
    #[error("token verification failed: {0}")]
    Verification(#[from] jsonwebtoken::errors::Error),
    #[error("{0}")]
    InvalidClaims(String),
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<FetchError> for Error {
    fn from(err: FetchError) -> Self {
        Error::Fetch(err)
    }
}
