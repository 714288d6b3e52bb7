//! Domain error taxonomy for the access model (graph + mapping tables).
//!
//! Every variant here corresponds to one of the argument/not-found errors
//! in the engine's error handling design. Callers at the RPC boundary
//! convert these into wire statuses via `access-infra`'s error-to-status
//! converter; nothing in this crate knows about transport codes.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("group not found: {0}")]
    GroupNotFound(String),

    #[error("entity type not found: {0}")]
    EntityTypeNotFound(String),

    #[error("entity not found: {0} in type {1}")]
    EntityNotFound(String, String),

    #[error("{kind} identifier must contain at least one non-whitespace character")]
    EmptyIdentifier { kind: &'static str },

    #[error("edge already exists: {0} -> {1}")]
    EdgeAlreadyExists(String, String),

    #[error("edge does not exist: {0} -> {1}")]
    EdgeDoesNotExist(String, String),

    #[error("mapping already exists")]
    MappingAlreadyExists,

    #[error("mapping does not exist")]
    MappingDoesNotExist,

    #[error("vertex already exists: {0}")]
    VertexAlreadyExists(String),

    #[error("adding edge {0} -> {1} would create a cycle")]
    CircularReference(String, String),
}

impl DomainError {
    /// Name used as the `ParameterName` attribute and as the wire status
    /// code's logical exception name.
    pub fn parameter_name(&self) -> &'static str {
        match self {
            DomainError::UserNotFound(_) => "UserId",
            DomainError::GroupNotFound(_) => "GroupId",
            DomainError::EntityTypeNotFound(_) => "EntityType",
            DomainError::EntityNotFound(_, _) => "Entity",
            DomainError::EmptyIdentifier { .. } => "Identifier",
            DomainError::EdgeAlreadyExists(_, _) | DomainError::EdgeDoesNotExist(_, _) => "Edge",
            DomainError::MappingAlreadyExists | DomainError::MappingDoesNotExist => "Mapping",
            DomainError::VertexAlreadyExists(_) => "Vertex",
            DomainError::CircularReference(_, _) => "Edge",
        }
    }
}
