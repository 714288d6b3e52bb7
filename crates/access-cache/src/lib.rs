//! Fan-out and read replication: the persister distributor, the bounded
//! temporal event cache, and the reader refresh loop.

pub mod distributor;
pub mod error;
pub mod refresh;
pub mod temporal_cache;

pub use distributor::PersisterDistributor;
pub use error::CacheError;
pub use refresh::{ReaderRefreshError, ReaderRefreshLoop};
pub use temporal_cache::TemporalEventCache;
