//! The access model: the directed graph plus the four mapping tables,
//! answering effective-access queries by combining direct mappings with
//! transitively-reachable group mappings.
//!
//! `AccessModel` is the single in-memory authority mutated by the writer
//! (through the validator/buffer pipeline in `access-core`) and replicated,
//! read-only, by readers. It has no knowledge of events, sequence numbers,
//! or persistence — those live one layer up.

use indexmap::IndexSet;
use std::collections::HashMap;

use crate::error::DomainError;
use crate::graph::DirectedGraph;
use crate::ids::{ComponentAccess, EntityId, EntityRef, EntityType, GroupId, UserId};

#[derive(Debug, Default)]
pub struct AccessModel {
    graph: DirectedGraph,
    user_components: HashMap<UserId, IndexSet<ComponentAccess>>,
    group_components: HashMap<GroupId, IndexSet<ComponentAccess>>,
    user_entities: HashMap<UserId, IndexSet<EntityRef>>,
    group_entities: HashMap<GroupId, IndexSet<EntityRef>>,
    known_entity_types: IndexSet<EntityType>,
    known_entities: HashMap<EntityType, IndexSet<EntityId>>,
}

impl AccessModel {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- vertices -----------------------------------------------------

    pub fn add_user(&mut self, user: UserId) -> Result<(), DomainError> {
        self.graph.add_leaf(user.clone())?;
        self.user_components.insert(user.clone(), IndexSet::new());
        self.user_entities.insert(user, IndexSet::new());
        Ok(())
    }

    /// Removes a user and purges every outgoing mapping transitively:
    /// group memberships, component grants, entity grants.
    pub fn remove_user(&mut self, user: &UserId) -> Result<(), DomainError> {
        self.graph.remove_leaf(user)?;
        self.user_components.remove(user);
        self.user_entities.remove(user);
        Ok(())
    }

    pub fn add_group(&mut self, group: GroupId) -> Result<(), DomainError> {
        self.graph.add_non_leaf(group.clone())?;
        self.group_components.insert(group.clone(), IndexSet::new());
        self.group_entities.insert(group, IndexSet::new());
        Ok(())
    }

    pub fn remove_group(&mut self, group: &GroupId) -> Result<(), DomainError> {
        self.graph.remove_non_leaf(group)?;
        self.group_components.remove(group);
        self.group_entities.remove(group);
        Ok(())
    }

    pub fn contains_user(&self, user: &UserId) -> bool {
        self.graph.contains_leaf(user)
    }

    pub fn contains_group(&self, group: &GroupId) -> bool {
        self.graph.contains_non_leaf(group)
    }

    // ---- group membership edges ----------------------------------------

    pub fn add_user_to_group(&mut self, user: &UserId, group: &GroupId) -> Result<(), DomainError> {
        self.graph.add_leaf_edge(user, group)
    }

    pub fn remove_user_from_group(&mut self, user: &UserId, group: &GroupId) -> Result<(), DomainError> {
        self.graph.remove_leaf_edge(user, group)
    }

    pub fn add_group_to_group(&mut self, child: &GroupId, parent: &GroupId) -> Result<(), DomainError> {
        self.graph.add_non_leaf_edge(child, parent)
    }

    pub fn remove_group_from_group(&mut self, child: &GroupId, parent: &GroupId) -> Result<(), DomainError> {
        self.graph.remove_non_leaf_edge(child, parent)
    }

    // ---- component mappings --------------------------------------------

    pub fn add_user_component(&mut self, user: &UserId, access: ComponentAccess) -> Result<(), DomainError> {
        let set = self.user_components.get_mut(user).ok_or_else(|| DomainError::UserNotFound(user.to_string()))?;
        if !set.insert(access) {
            return Err(DomainError::MappingAlreadyExists);
        }
        Ok(())
    }

    pub fn remove_user_component(&mut self, user: &UserId, access: &ComponentAccess) -> Result<(), DomainError> {
        let set = self.user_components.get_mut(user).ok_or_else(|| DomainError::UserNotFound(user.to_string()))?;
        if !set.shift_remove(access) {
            return Err(DomainError::MappingDoesNotExist);
        }
        Ok(())
    }

    pub fn add_group_component(&mut self, group: &GroupId, access: ComponentAccess) -> Result<(), DomainError> {
        let set = self.group_components.get_mut(group).ok_or_else(|| DomainError::GroupNotFound(group.to_string()))?;
        if !set.insert(access) {
            return Err(DomainError::MappingAlreadyExists);
        }
        Ok(())
    }

    pub fn remove_group_component(&mut self, group: &GroupId, access: &ComponentAccess) -> Result<(), DomainError> {
        let set = self.group_components.get_mut(group).ok_or_else(|| DomainError::GroupNotFound(group.to_string()))?;
        if !set.shift_remove(access) {
            return Err(DomainError::MappingDoesNotExist);
        }
        Ok(())
    }

    // ---- entity type / entity registry ----------------------------------

    pub fn register_entity_type(&mut self, entity_type: EntityType) -> Result<(), DomainError> {
        if !self.known_entity_types.insert(entity_type.clone()) {
            return Err(DomainError::MappingAlreadyExists);
        }
        self.known_entities.insert(entity_type, IndexSet::new());
        Ok(())
    }

    /// Purges every mapping referencing `entity_type`.
    pub fn remove_entity_type(&mut self, entity_type: &EntityType) -> Result<(), DomainError> {
        if !self.known_entity_types.shift_remove(entity_type) {
            return Err(DomainError::EntityTypeNotFound(entity_type.to_string()));
        }
        self.known_entities.remove(entity_type);
        for set in self.user_entities.values_mut() {
            set.retain(|r| &r.entity_type != entity_type);
        }
        for set in self.group_entities.values_mut() {
            set.retain(|r| &r.entity_type != entity_type);
        }
        Ok(())
    }

    pub fn entity_type_exists(&self, entity_type: &EntityType) -> bool {
        self.known_entity_types.contains(entity_type)
    }

    /// Registers a concrete entity within an already-registered entity type.
    pub fn register_entity(&mut self, entity_type: &EntityType, entity: EntityId) -> Result<(), DomainError> {
        let set = self.known_entities.get_mut(entity_type).ok_or_else(|| DomainError::EntityTypeNotFound(entity_type.to_string()))?;
        if !set.insert(entity) {
            return Err(DomainError::MappingAlreadyExists);
        }
        Ok(())
    }

    pub fn remove_entity(&mut self, entity_type: &EntityType, entity: &EntityId) -> Result<(), DomainError> {
        let set = self.known_entities.get_mut(entity_type).ok_or_else(|| DomainError::EntityTypeNotFound(entity_type.to_string()))?;
        if !set.shift_remove(entity) {
            return Err(DomainError::EntityNotFound(entity.to_string(), entity_type.to_string()));
        }
        for users in self.user_entities.values_mut() {
            users.retain(|r| !(&r.entity_type == entity_type && &r.entity == entity));
        }
        for groups in self.group_entities.values_mut() {
            groups.retain(|r| !(&r.entity_type == entity_type && &r.entity == entity));
        }
        Ok(())
    }

    pub fn entity_exists(&self, entity_type: &EntityType, entity: &EntityId) -> bool {
        self.known_entities.get(entity_type).is_some_and(|set| set.contains(entity))
    }

    // ---- entity mappings -------------------------------------------------

    pub fn add_user_entity(&mut self, user: &UserId, entity: EntityRef) -> Result<(), DomainError> {
        if !self.entity_exists(&entity.entity_type, &entity.entity) {
            return Err(DomainError::EntityNotFound(entity.entity.to_string(), entity.entity_type.to_string()));
        }
        let set = self.user_entities.get_mut(user).ok_or_else(|| DomainError::UserNotFound(user.to_string()))?;
        if !set.insert(entity) {
            return Err(DomainError::MappingAlreadyExists);
        }
        Ok(())
    }

    pub fn remove_user_entity(&mut self, user: &UserId, entity: &EntityRef) -> Result<(), DomainError> {
        let set = self.user_entities.get_mut(user).ok_or_else(|| DomainError::UserNotFound(user.to_string()))?;
        if !set.shift_remove(entity) {
            return Err(DomainError::MappingDoesNotExist);
        }
        Ok(())
    }

    pub fn add_group_entity(&mut self, group: &GroupId, entity: EntityRef) -> Result<(), DomainError> {
        if !self.entity_exists(&entity.entity_type, &entity.entity) {
            return Err(DomainError::EntityNotFound(entity.entity.to_string(), entity.entity_type.to_string()));
        }
        let set = self.group_entities.get_mut(group).ok_or_else(|| DomainError::GroupNotFound(group.to_string()))?;
        if !set.insert(entity) {
            return Err(DomainError::MappingAlreadyExists);
        }
        Ok(())
    }

    pub fn remove_group_entity(&mut self, group: &GroupId, entity: &EntityRef) -> Result<(), DomainError> {
        let set = self.group_entities.get_mut(group).ok_or_else(|| DomainError::GroupNotFound(group.to_string()))?;
        if !set.shift_remove(entity) {
            return Err(DomainError::MappingDoesNotExist);
        }
        Ok(())
    }

    // ---- queries ----------------------------------------------------------

    /// All groups reachable from `user` (direct parents plus transitive
    /// ancestors), deduplicated.
    fn reachable_groups(&self, user: &UserId) -> Result<IndexSet<GroupId>, DomainError> {
        if !self.contains_user(user) {
            return Err(DomainError::UserNotFound(user.to_string()));
        }
        let mut reached = IndexSet::new();
        self.graph.traverse_from_leaf(user, |g| {
            reached.insert(g.clone());
            true
        });
        Ok(reached)
    }

    pub fn has_access_to_application_component(&self, user: &UserId, access: &ComponentAccess) -> Result<bool, DomainError> {
        if !self.contains_user(user) {
            return Err(DomainError::UserNotFound(user.to_string()));
        }
        if self.user_components.get(user).is_some_and(|set| set.contains(access)) {
            return Ok(true);
        }
        let mut found = false;
        self.graph.traverse_from_leaf(user, |g| {
            if self.group_components.get(g).is_some_and(|set| set.contains(access)) {
                found = true;
                false
            } else {
                true
            }
        });
        Ok(found)
    }

    pub fn application_components_accessible_by_user(&self, user: &UserId) -> Result<IndexSet<ComponentAccess>, DomainError> {
        let mut result: IndexSet<ComponentAccess> = self.user_components
            .get(user)
            .ok_or_else(|| DomainError::UserNotFound(user.to_string()))?
            .clone();
        for group in self.reachable_groups(user)? {
            if let Some(set) = self.group_components.get(&group) {
                result.extend(set.iter().cloned());
            }
        }
        Ok(result)
    }

    pub fn entities_accessible_by_user(&self, user: &UserId, entity_type: &EntityType) -> Result<IndexSet<EntityRef>, DomainError> {
        if !self.entity_type_exists(entity_type) {
            return Err(DomainError::EntityTypeNotFound(entity_type.to_string()));
        }
        let direct = self.user_entities
            .get(user)
            .ok_or_else(|| DomainError::UserNotFound(user.to_string()))?;
        let mut result: IndexSet<EntityRef> = direct.iter().filter(|r| &r.entity_type == entity_type).cloned().collect();
        for group in self.reachable_groups(user)? {
            if let Some(set) = self.group_entities.get(&group) {
                result.extend(set.iter().filter(|r| &r.entity_type == entity_type).cloned());
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_grants_access_via_group_membership() {
        let mut model = AccessModel::new();
        model.add_user(UserId::new("alice")).unwrap();
        model.add_group(GroupId::new("admins")).unwrap();
        model.add_user_to_group(&UserId::new("alice"), &GroupId::new("admins")).unwrap();
        model.add_group_component(&GroupId::new("admins"), ComponentAccess::new("Billing", "Modify")).unwrap();

        assert!(model.has_access_to_application_component(&UserId::new("alice"), &ComponentAccess::new("Billing", "Modify")).unwrap());

        let accessible = model.application_components_accessible_by_user(&UserId::new("alice")).unwrap();
        assert_eq!(accessible.len(), 1);
        assert!(accessible.contains(&ComponentAccess::new("Billing", "Modify")));
    }

    #[test]
    fn remove_user_purges_every_outgoing_mapping() {
        let mut model = AccessModel::new();
        model.add_user(UserId::new("bob")).unwrap();
        model.add_group(GroupId::new("g")).unwrap();
        model.add_user_to_group(&UserId::new("bob"), &GroupId::new("g")).unwrap();
        model.add_user_component(&UserId::new("bob"), ComponentAccess::new("C", "L")).unwrap();

        model.remove_user(&UserId::new("bob")).unwrap();

        assert!(!model.contains_user(&UserId::new("bob")));
        assert!(model.has_access_to_application_component(&UserId::new("bob"), &ComponentAccess::new("C", "L")).is_err());
    }

    #[test]
    fn unknown_entity_type_is_rejected() {
        let model = AccessModel::new();
        let err = model.entity_type_exists(&EntityType::new("Document").unwrap());
        assert!(!err);
    }
}
