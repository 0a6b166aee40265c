//! read cache settings from a file or the environment

use std::path::Path;
use std::time::Duration;

use crate::errors::Error;

pub const NAME_ENV: &str = "JWT_CACHE_NAME";
pub const HEADROOM_ENV: &str = "JWT_CACHE_HEADROOM_SECS";

#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Label attached to every diagnostic the cache emits.
    pub name: String,
    /// How many seconds before `exp` a cached token is treated as expired.
    pub headroom_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            headroom_secs: 1,
        }
    }
}

impl CacheConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Self::default();
        if let Some(name) = lookup(NAME_ENV) {
            config.name = name;
        }
        if let Some(raw) = lookup(HEADROOM_ENV) {
            config.headroom_secs = raw.trim().parse().map_err(|e| {
                Error::Config(format!("Invalid {HEADROOM_ENV} value '{raw}': {e}"))
            })?;
        }
        Ok(config)
    }

    pub fn headroom(&self) -> Duration {
        Duration::from_secs(self.headroom_secs)
    }
}
