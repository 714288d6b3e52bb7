//! The write-path core: event model, validator, per-category buffer, flush
//! strategies, and the k-way merge flusher.
//!
//! `access-core` depends on `access-domain` only. It defines the
//! `EventSink` trait that `access-providers` (the persister) and
//! `access-cache` (the temporal cache, reader replication) implement, so
//! neither of those crates has to be a dependency of this one.

pub mod buffer;
pub mod errors;
pub mod event;
pub mod flush_strategy;
pub mod flusher;
pub mod sink;
pub mod validator;

pub use buffer::PerCategoryEventBuffer;
pub use errors::CoreError;
pub use event::{EventAction, EventFamily, EventPayload, TemporalEvent};
pub use flush_strategy::{FlushStrategy, IntervalTriggeredFlushStrategy, SizeTriggeredFlushStrategy};
pub use flusher::{FlushMetrics, KWayMergeFlusher};
pub use sink::{EventSink, SinkError};
pub use validator::{apply_payload, EventValidator, ValidationOutcome, ValidatorConfig};
