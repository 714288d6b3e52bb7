//! access-domain
//!
//! The in-memory access model: a directed graph of users and groups plus
//! the mapping tables from users/groups to application-component access
//! and to entities. This crate is pure and synchronous — no
//! events, no locking, no I/O. `access-core` builds the event-sourced write
//! path on top of it; `access-cache` replays events onto reader replicas of
//! it.

pub mod error;
pub mod graph;
pub mod ids;
pub mod model;

pub use error::DomainError;
pub use graph::DirectedGraph;
pub use ids::{AccessLevelId, ComponentAccess, ComponentId, EntityId, EntityRef, EntityType, GroupId, UserId};
pub use model::AccessModel;
