use jiff::{SignedDuration, Timestamp};
use tracing::{Dispatch, Level, dispatcher, event};
use uuid::Uuid;

use crate::errors::Error;
use crate::source::FetchError;

/// Emits the events of one cache, tagged with its name. Events go to the
/// explicit `Dispatch` when one was configured, otherwise to whatever
/// subscriber is globally installed (nothing, if none is).
#[derive(Clone, Debug)]
pub(crate) struct CacheTelemetry {
    name: String,
    dispatch: Option<Dispatch>,
}

impl CacheTelemetry {
    pub fn new(name: impl Into<String>, dispatch: Option<Dispatch>) -> Self {
        Self {
            name: name.into(),
            dispatch,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn emit(&self, f: impl FnOnce()) {
        match &self.dispatch {
            Some(dispatch) => dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }

    /// Marks the start of a fetch and returns the id correlating its events.
    pub fn emit_fetch_start(&self) -> Uuid {
        let attempt_id = Uuid::new_v4();
        self.emit(|| {
            event!(
                Level::DEBUG,
                cache = %self.name,
                attempt_id = %attempt_id,
                "fetch.start"
            );
        });
        attempt_id
    }

    pub fn emit_fetch_failure(&self, attempt_id: Uuid, error: &FetchError) {
        self.emit(|| {
            event!(
                Level::WARN,
                cache = %self.name,
                attempt_id = %attempt_id,
                error = %error,
                "fetch.failure"
            );
        });
    }

    pub fn emit_parse_failed(&self, error: &Error) {
        self.emit(|| {
            event!(
                Level::DEBUG,
                cache = %self.name,
                error = %error,
                "token.parse_failed"
            );
        });
    }

    pub fn emit_verification_failed(&self, error: &Error) {
        self.emit(|| {
            event!(
                Level::DEBUG,
                cache = %self.name,
                error = %error,
                "token.verification_failed"
            );
        });
    }

    pub fn emit_not_cached(&self, reason: &str) {
        self.emit(|| {
            event!(
                Level::INFO,
                cache = %self.name,
                reason,
                "token.not_cached"
            );
        });
    }

    pub fn emit_cached_for(&self, lifetime: SignedDuration) {
        self.emit(|| {
            event!(
                Level::DEBUG,
                cache = %self.name,
                lifetime = ?lifetime,
                "token.cached"
            );
        });
    }

    pub fn emit_cached_until(&self, until: Timestamp) {
        self.emit(|| {
            event!(
                Level::DEBUG,
                cache = %self.name,
                until = %until,
                "token.cached"
            );
        });
    }
}
