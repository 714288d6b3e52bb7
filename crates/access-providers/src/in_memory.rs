//! A reference `Persister`: durable storage backed by a `Vec` guarded by a
//! mutex. Not meant for production use — it exists for tests and for
//! `access-cli`'s single-process demo.

use std::sync::Mutex;

use access_core::{apply_payload, EventSink, SinkError, TemporalEvent};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::persister::{validate_event, Persister};

#[derive(Default)]
pub struct InMemoryPersister {
    log: Mutex<Vec<TemporalEvent>>,
}

impl InMemoryPersister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_count(&self) -> usize {
        self.log.lock().expect("in-memory persister mutex poisoned").len()
    }
}

#[async_trait]
impl EventSink for InMemoryPersister {
    async fn apply(&self, event: &TemporalEvent) -> Result<(), SinkError> {
        validate_event(event).map_err(|e| SinkError::new(e.to_string()))?;
        let mut log = self.log.lock().expect("in-memory persister mutex poisoned");
        if let Some(last) = log.last() {
            if event.sequence_number <= last.sequence_number {
                let err = PersistenceError::OutOfOrderSequence { expected: last.sequence_number + 1, got: event.sequence_number };
                return Err(SinkError::new(err.to_string()));
            }
        }
        if log.iter().any(|e| e.event_id == event.event_id) {
            return Err(SinkError::new(PersistenceError::DuplicateEvent(event.event_id.to_string()).to_string()));
        }
        log.push(event.clone());
        Ok(())
    }
}

#[async_trait]
impl Persister for InMemoryPersister {
    async fn load(&self, model: &mut access_domain::AccessModel) -> Result<Option<(Uuid, DateTime<Utc>, i64)>, PersistenceError> {
        let log = self.log.lock().expect("in-memory persister mutex poisoned");
        let mut last = None;
        for event in log.iter() {
            apply_payload(model, event.action, &event.payload).map_err(|e| PersistenceError::Store(e.to_string()))?;
            last = Some((event.event_id, event.occurred_at, event.sequence_number));
        }
        Ok(last)
    }

    async fn events_since(&self, since: i64) -> Result<Vec<TemporalEvent>, PersistenceError> {
        let log = self.log.lock().expect("in-memory persister mutex poisoned");
        Ok(log.iter().filter(|e| e.sequence_number > since).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use access_core::{EventAction, EventPayload};
    use access_domain::{AccessModel, UserId};

    #[tokio::test]
    async fn load_replays_events_in_order() {
        let persister = InMemoryPersister::new();
        for (seq, name) in [(1, "alice"), (2, "bob")] {
            let event = TemporalEvent {
                event_id: Uuid::new_v4(),
                action: EventAction::Add,
                payload: EventPayload::User { user: UserId::new(name) },
                occurred_at: Utc::now(),
                sequence_number: seq,
            };
            persister.apply(&event).await.unwrap();
        }

        let mut model = AccessModel::new();
        let last = persister.load(&mut model).await.unwrap().unwrap();
        assert_eq!(last.2, 2);
        assert!(model.contains_user(&UserId::new("alice")));
        assert!(model.contains_user(&UserId::new("bob")));
    }

    #[tokio::test]
    async fn apply_rejects_out_of_order_sequence() {
        let persister = InMemoryPersister::new();
        let first = TemporalEvent {
            event_id: Uuid::new_v4(),
            action: EventAction::Add,
            payload: EventPayload::User { user: UserId::new("alice") },
            occurred_at: Utc::now(),
            sequence_number: 5,
        };
        persister.apply(&first).await.unwrap();

        let second = TemporalEvent { sequence_number: 3, ..first.clone() };
        assert!(persister.apply(&second).await.is_err());
    }
}
