//! Error taxonomy for the write path: validation, buffering, and flushing.

use access_domain::DomainError;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum CoreError {
    /// The proposed mutation would leave the access model in an illegal
    /// state — the dry-run check failed, so no event was buffered.
    #[error("validation failed: {0}")]
    Validation(#[from] DomainError),

    /// The flush's persister fan-out failed; the writer cannot guarantee
    /// durability for the flushed batch. This is the canonical trigger for
    /// the trip switch.
    #[error("flush failed: {0}")]
    FlushFailed(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn parameter_name(&self) -> &'static str {
        match self {
            CoreError::Validation(e) => e.parameter_name(),
            CoreError::FlushFailed(_) => "Flush",
            CoreError::Internal(_) => "Internal",
        }
    }
}
