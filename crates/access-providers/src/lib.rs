//! The persistence layer: the `Persister` trait consumed by the flusher
//! and the reader refresh loop, plus an in-memory reference
//! implementation.

pub mod error;
pub mod in_memory;
pub mod persister;

pub use error::PersistenceError;
pub use in_memory::InMemoryPersister;
pub use persister::Persister;
