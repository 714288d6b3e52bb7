//! The event validator.
//!
//! A dry-run check against the access model decides whether a mutation is
//! legal before anything is buffered, so the recorded event and the
//! in-memory mutation always come from identical decision logic.
//! `AccessModel`'s own mutation methods are all-or-nothing `Result`-returning
//! operations with no partial-mutation path, so the validator checks
//! preconditions and then performs the very same call the event will
//! describe, rather than running two separate passes over a snapshot.

use access_domain::{AccessModel, DomainError};

use crate::event::{EventAction, EventPayload};

/// What the buffer should do with a proposed `(action, payload)` pair.
pub enum ValidationOutcome {
    /// Apply the mutation to the model and buffer the event.
    Apply,
    /// Dependency-free mode only: the add is already satisfied, succeed
    /// without mutating the model or buffering an event.
    Noop,
    /// Dependency-free mode only: `payload` depends on an endpoint that does
    /// not exist yet. The buffer must first recursively validate-and-append
    /// a synthetic `Add` for `prerequisite`, with its own sequence number
    /// allocated before the dependent event's, then retry.
    SynthesizePrerequisite(Box<EventPayload>),
    Reject(DomainError),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatorConfig {
    /// When set, a dependent `Add` whose prerequisite is missing does not
    /// fail: the validator prepends a synthetic prerequisite `Add` instead
    /// ("dependency-free" mode). Default is strict mode (off): missing
    /// prerequisites are rejected.
    pub dependency_free: bool,
}

pub struct EventValidator {
    config: ValidatorConfig,
}

impl EventValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Dry-run check: does `(action, payload)` leave `model` in a legal
    /// state? Never mutates `model`.
    pub fn check(&self, model: &AccessModel, action: EventAction, payload: &EventPayload) -> ValidationOutcome {
        match (action, payload) {
            (EventAction::Add, EventPayload::User { user }) => {
                if model.contains_user(user) {
                    return self.idempotent_or_reject(DomainError::VertexAlreadyExists(user.to_string()));
                }
                ValidationOutcome::Apply
            }
            (EventAction::Remove, EventPayload::User { user }) => {
                if !model.contains_user(user) {
                    return ValidationOutcome::Reject(DomainError::UserNotFound(user.to_string()));
                }
                ValidationOutcome::Apply
            }
            (EventAction::Add, EventPayload::Group { group }) => {
                if model.contains_group(group) {
                    return self.idempotent_or_reject(DomainError::VertexAlreadyExists(group.to_string()));
                }
                ValidationOutcome::Apply
            }
            (EventAction::Remove, EventPayload::Group { group }) => {
                if !model.contains_group(group) {
                    return ValidationOutcome::Reject(DomainError::GroupNotFound(group.to_string()));
                }
                ValidationOutcome::Apply
            }
            (EventAction::Add, EventPayload::UserGroup { user, group }) => {
                if !model.contains_user(user) {
                    return self.missing_prerequisite(EventPayload::User { user: user.clone() }, DomainError::UserNotFound(user.to_string()));
                }
                if !model.contains_group(group) {
                    return self.missing_prerequisite(EventPayload::Group { group: group.clone() }, DomainError::GroupNotFound(group.to_string()));
                }
                ValidationOutcome::Apply
            }
            (EventAction::Remove, EventPayload::UserGroup { .. }) => ValidationOutcome::Apply,
            (EventAction::Add, EventPayload::GroupGroup { child, parent }) => {
                if !model.contains_group(child) {
                    return self.missing_prerequisite(EventPayload::Group { group: child.clone() }, DomainError::GroupNotFound(child.to_string()));
                }
                if !model.contains_group(parent) {
                    return self.missing_prerequisite(EventPayload::Group { group: parent.clone() }, DomainError::GroupNotFound(parent.to_string()));
                }
                ValidationOutcome::Apply
            }
            (EventAction::Remove, EventPayload::GroupGroup { .. }) => ValidationOutcome::Apply,
            (EventAction::Add, EventPayload::UserComponent { user, .. }) => {
                if !model.contains_user(user) {
                    return self.missing_prerequisite(EventPayload::User { user: user.clone() }, DomainError::UserNotFound(user.to_string()));
                }
                ValidationOutcome::Apply
            }
            (EventAction::Remove, EventPayload::UserComponent { .. }) => ValidationOutcome::Apply,
            (EventAction::Add, EventPayload::GroupComponent { group, .. }) => {
                if !model.contains_group(group) {
                    return self.missing_prerequisite(EventPayload::Group { group: group.clone() }, DomainError::GroupNotFound(group.to_string()));
                }
                ValidationOutcome::Apply
            }
            (EventAction::Remove, EventPayload::GroupComponent { .. }) => ValidationOutcome::Apply,
            (EventAction::Add, EventPayload::EntityType { entity_type }) => {
                if model.entity_type_exists(entity_type) {
                    return self.idempotent_or_reject(DomainError::MappingAlreadyExists);
                }
                ValidationOutcome::Apply
            }
            (EventAction::Remove, EventPayload::EntityType { entity_type }) => {
                if !model.entity_type_exists(entity_type) {
                    return ValidationOutcome::Reject(DomainError::EntityTypeNotFound(entity_type.to_string()));
                }
                ValidationOutcome::Apply
            }
            (EventAction::Add, EventPayload::Entity { entity_type, entity }) => {
                if !model.entity_type_exists(entity_type) {
                    return self.missing_prerequisite(EventPayload::EntityType { entity_type: entity_type.clone() }, DomainError::EntityTypeNotFound(entity_type.to_string()));
                }
                if model.entity_exists(entity_type, entity) {
                    return self.idempotent_or_reject(DomainError::MappingAlreadyExists);
                }
                ValidationOutcome::Apply
            }
            (EventAction::Remove, EventPayload::Entity { entity_type, entity }) => {
                if !model.entity_exists(entity_type, entity) {
                    return ValidationOutcome::Reject(DomainError::EntityNotFound(entity.to_string(), entity_type.to_string()));
                }
                ValidationOutcome::Apply
            }
            (EventAction::Add, EventPayload::UserEntity { user, entity }) => {
                if !model.contains_user(user) {
                    return self.missing_prerequisite(EventPayload::User { user: user.clone() }, DomainError::UserNotFound(user.to_string()));
                }
                if !model.entity_exists(&entity.entity_type, &entity.entity) {
                    return self.missing_prerequisite(
                        EventPayload::Entity { entity_type: entity.entity_type.clone(), entity: entity.entity.clone() },
                        DomainError::EntityNotFound(entity.entity.to_string(), entity.entity_type.to_string()),
                    );
                }
                ValidationOutcome::Apply
            }
            (EventAction::Remove, EventPayload::UserEntity { .. }) => ValidationOutcome::Apply,
            (EventAction::Add, EventPayload::GroupEntity { group, entity }) => {
                if !model.contains_group(group) {
                    return self.missing_prerequisite(EventPayload::Group { group: group.clone() }, DomainError::GroupNotFound(group.to_string()));
                }
                if !model.entity_exists(&entity.entity_type, &entity.entity) {
                    return self.missing_prerequisite(
                        EventPayload::Entity { entity_type: entity.entity_type.clone(), entity: entity.entity.clone() },
                        DomainError::EntityNotFound(entity.entity.to_string(), entity.entity_type.to_string()),
                    );
                }
                ValidationOutcome::Apply
            }
            (EventAction::Remove, EventPayload::GroupEntity { .. }) => ValidationOutcome::Apply,
        }
    }

    fn idempotent_or_reject(&self, err: DomainError) -> ValidationOutcome {
        if self.config.dependency_free {
            ValidationOutcome::Noop
        } else {
            ValidationOutcome::Reject(err)
        }
    }

    fn missing_prerequisite(&self, prerequisite: EventPayload, err: DomainError) -> ValidationOutcome {
        if self.config.dependency_free {
            ValidationOutcome::SynthesizePrerequisite(Box::new(prerequisite))
        } else {
            ValidationOutcome::Reject(err)
        }
    }
}

/// Applies an already-validated `(action, payload)` pair to `model`. Used by
/// the buffer after `EventValidator::check` returns `Apply`; this is the
/// same decision logic the check above used, applied for real.
pub fn apply_payload(model: &mut AccessModel, action: EventAction, payload: &EventPayload) -> Result<(), DomainError> {
    match (action, payload) {
        (EventAction::Add, EventPayload::User { user }) => model.add_user(user.clone()),
        (EventAction::Remove, EventPayload::User { user }) => model.remove_user(user),
        (EventAction::Add, EventPayload::Group { group }) => model.add_group(group.clone()),
        (EventAction::Remove, EventPayload::Group { group }) => model.remove_group(group),
        (EventAction::Add, EventPayload::UserGroup { user, group }) => model.add_user_to_group(user, group),
        (EventAction::Remove, EventPayload::UserGroup { user, group }) => model.remove_user_from_group(user, group),
        (EventAction::Add, EventPayload::GroupGroup { child, parent }) => model.add_group_to_group(child, parent),
        (EventAction::Remove, EventPayload::GroupGroup { child, parent }) => model.remove_group_from_group(child, parent),
        (EventAction::Add, EventPayload::UserComponent { user, access }) => model.add_user_component(user, access.clone()),
        (EventAction::Remove, EventPayload::UserComponent { user, access }) => model.remove_user_component(user, access),
        (EventAction::Add, EventPayload::GroupComponent { group, access }) => model.add_group_component(group, access.clone()),
        (EventAction::Remove, EventPayload::GroupComponent { group, access }) => model.remove_group_component(group, access),
        (EventAction::Add, EventPayload::EntityType { entity_type }) => model.register_entity_type(entity_type.clone()),
        (EventAction::Remove, EventPayload::EntityType { entity_type }) => model.remove_entity_type(entity_type),
        (EventAction::Add, EventPayload::Entity { entity_type, entity }) => model.register_entity(entity_type, entity.clone()),
        (EventAction::Remove, EventPayload::Entity { entity_type, entity }) => model.remove_entity(entity_type, entity),
        (EventAction::Add, EventPayload::UserEntity { user, entity }) => model.add_user_entity(user, entity.clone()),
        (EventAction::Remove, EventPayload::UserEntity { user, entity }) => model.remove_user_entity(user, entity),
        (EventAction::Add, EventPayload::GroupEntity { group, entity }) => model.add_group_entity(group, entity.clone()),
        (EventAction::Remove, EventPayload::GroupEntity { group, entity }) => model.remove_group_entity(group, entity),
    }
}
