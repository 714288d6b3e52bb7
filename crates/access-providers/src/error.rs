//! Persistence error taxonomy.
//!
//! There is no concrete storage driver here (persisters are an interface
//! the caller supplies), so this enum covers the contract violations a
//! `Persister` implementation itself can hit while replaying its durable
//! log.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("event sequence number {0} is not positive")]
    NonPositiveSequence(i64),

    #[error("sequence numbers out of order: expected > {expected}, got {got}")]
    OutOfOrderSequence { expected: i64, got: i64 },

    #[error("duplicate event id {0}")]
    DuplicateEvent(String),

    #[error("underlying store error: {0}")]
    Store(String),
}
