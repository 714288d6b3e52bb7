//! Event families and the `TemporalEvent` envelope.
//!
//! Ten event families mirror the ten mutation categories the access model
//! supports. Every family shares one `TemporalEvent`/`EventPayload` shape
//! and is routed through a dispatch table keyed by `EventFamily` (see
//! `crate::buffer`), rather than needing ten near-identical buffer/flush
//! implementations.

use access_domain::{ComponentAccess, EntityRef, EntityType, GroupId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One of the ten independently-buffered mutation categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventFamily {
    User,
    Group,
    UserGroup,
    GroupGroup,
    UserComponent,
    GroupComponent,
    EntityType,
    Entity,
    UserEntity,
    GroupEntity,
}

impl EventFamily {
    pub const COUNT: usize = 10;

    pub const ALL: [EventFamily; Self::COUNT] = [
        EventFamily::User,
        EventFamily::Group,
        EventFamily::UserGroup,
        EventFamily::GroupGroup,
        EventFamily::UserComponent,
        EventFamily::GroupComponent,
        EventFamily::EntityType,
        EventFamily::Entity,
        EventFamily::UserEntity,
        EventFamily::GroupEntity,
    ];

    /// Dense index into the ten-slot buffer array.
    pub fn index(self) -> usize {
        match self {
            EventFamily::User => 0,
            EventFamily::Group => 1,
            EventFamily::UserGroup => 2,
            EventFamily::GroupGroup => 3,
            EventFamily::UserComponent => 4,
            EventFamily::GroupComponent => 5,
            EventFamily::EntityType => 6,
            EventFamily::Entity => 7,
            EventFamily::UserEntity => 8,
            EventFamily::GroupEntity => 9,
        }
    }
}

/// Whether the event grants (`Add`) or revokes (`Remove`) its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventAction {
    Add,
    Remove,
}

/// The mutation body. Every variant maps 1:1 onto an `EventFamily` and onto
/// one add/remove method pair on `AccessModel` (applied by `access-cache`'s
/// replay code) and on the persister (applied by the flusher and the
/// distributor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    User { user: UserId },
    Group { group: GroupId },
    UserGroup { user: UserId, group: GroupId },
    GroupGroup { child: GroupId, parent: GroupId },
    UserComponent { user: UserId, access: ComponentAccess },
    GroupComponent { group: GroupId, access: ComponentAccess },
    EntityType { entity_type: EntityType },
    Entity { entity_type: EntityType, entity: access_domain::EntityId },
    UserEntity { user: UserId, entity: EntityRef },
    GroupEntity { group: GroupId, entity: EntityRef },
}

impl EventPayload {
    pub fn family(&self) -> EventFamily {
        match self {
            EventPayload::User { .. } => EventFamily::User,
            EventPayload::Group { .. } => EventFamily::Group,
            EventPayload::UserGroup { .. } => EventFamily::UserGroup,
            EventPayload::GroupGroup { .. } => EventFamily::GroupGroup,
            EventPayload::UserComponent { .. } => EventFamily::UserComponent,
            EventPayload::GroupComponent { .. } => EventFamily::GroupComponent,
            EventPayload::EntityType { .. } => EventFamily::EntityType,
            EventPayload::Entity { .. } => EventFamily::Entity,
            EventPayload::UserEntity { .. } => EventFamily::UserEntity,
            EventPayload::GroupEntity { .. } => EventFamily::GroupEntity,
        }
    }
}

/// An immutable, totally-ordered mutation record.
///
/// `occurred_at` is typed as `DateTime<Utc>` rather than checked at
/// construction: the type system enforces UTC so there is no runtime
/// branch to get wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalEvent {
    pub event_id: Uuid,
    pub action: EventAction,
    pub payload: EventPayload,
    pub occurred_at: DateTime<Utc>,
    pub sequence_number: i64,
}

impl TemporalEvent {
    pub fn family(&self) -> EventFamily {
        self.payload.family()
    }
}
