//! Opaque identifier types for the access model: a small family of
//! newtypes rather than generic parameters over the caller's own domain
//! types. The core only ever needs equality, hashing, and a string
//! rendering from an identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

macro_rules! opaque_id {
    ($name:ident, $label:expr) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        #[allow(dead_code)]
        const _: &str = $label;
    };
}

opaque_id!(UserId, "user");
opaque_id!(GroupId, "group");
opaque_id!(ComponentId, "component");
opaque_id!(AccessLevelId, "access level");

/// A non-empty, non-whitespace-only string naming an entity category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityType(String);

impl EntityType {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::EmptyIdentifier { kind: "EntityType" });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-empty, non-whitespace-only string naming a specific entity,
/// unique within its `EntityType`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::EmptyIdentifier { kind: "Entity" });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A `(Component, AccessLevel)` pair — the unit of application-component
/// permission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentAccess {
    pub component: ComponentId,
    pub level: AccessLevelId,
}

impl ComponentAccess {
    pub fn new(component: impl Into<ComponentId>, level: impl Into<AccessLevelId>) -> Self {
        Self { component: component.into(), level: level.into() }
    }
}

/// A `(EntityType, EntityId)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: EntityType,
    pub entity: EntityId,
}

impl EntityRef {
    pub fn new(entity_type: EntityType, entity: EntityId) -> Self {
        Self { entity_type, entity }
    }
}
