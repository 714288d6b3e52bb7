use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The requested event (or everything after it) has already been
    /// evicted from the bounded ring; the caller must fall back to the
    /// persister instead.
    #[error("event {0} is not in the temporal cache")]
    EventNotCached(String),
}
