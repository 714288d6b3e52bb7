//! The consumer-facing half of the write path: anything that can absorb an
//! ordered stream of `TemporalEvent`s. Both the durable persister and the
//! temporal event cache (defined one layer up, in `access-providers` and
//! `access-cache`) implement this; the k-way merge flusher and the
//! persister distributor are both written against it so neither has to
//! know which concrete consumer it is talking to.

use async_trait::async_trait;

use crate::event::TemporalEvent;

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn apply(&self, event: &TemporalEvent) -> Result<(), SinkError>;
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct SinkError(pub String);

impl SinkError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}
