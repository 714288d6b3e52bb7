//! The persister interface: the durable store a flush writes to, and the
//! source of truth a writer replays from on startup.
//!
//! Concrete storage drivers are out of scope here — this crate ships only
//! the trait and an in-memory reference implementation used by tests and
//! by `access-cli`'s demo wiring. A production deployment supplies its own
//! `Persister`, with Postgres or any other store being just one possible
//! implementation sitting behind the trait.

use access_core::{EventSink, TemporalEvent};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::PersistenceError;

/// A durable, sequence-ordered store of every event ever flushed.
///
/// `Persister: EventSink` so the flusher can dispatch to it without
/// knowing it is talking to durable storage rather than the temporal cache.
#[async_trait]
pub trait Persister: EventSink {
    /// Replays the full durable log into `model` in sequence order and
    /// returns the id and timestamp of the last event applied, for the
    /// reader refresh loop to resume from. Returns `None` if the log
    /// is empty.
    async fn load(&self, model: &mut access_domain::AccessModel) -> Result<Option<(Uuid, DateTime<Utc>, i64)>, PersistenceError>;

    /// Every event strictly after `since` (exclusive), in sequence order.
    /// Used by the reader refresh loop when the temporal cache has already
    /// evicted an event it needs (`EventNotCached`).
    async fn events_since(&self, since: i64) -> Result<Vec<TemporalEvent>, PersistenceError>;
}

pub(crate) fn validate_event(event: &TemporalEvent) -> Result<(), PersistenceError> {
    if event.sequence_number <= 0 {
        return Err(PersistenceError::NonPositiveSequence(event.sequence_number));
    }
    Ok(())
}
