//! access-manager: a distributed authorization engine.
//!
//! Exposes `WriterNode` and `ReaderNode`, the two process roles wired from
//! `EngineConfig`. The domain model and write/read-path machinery live in
//! the `access-domain`, `access-core`, `access-providers`, `access-cache`,
//! and `access-infra` crates; this crate only assembles them.

pub mod config;
pub mod reader;
pub mod writer;

pub use config::EngineConfig;
pub use reader::{QueryError, ReaderNode};
pub use writer::WriterNode;
