//! The temporal event cache: a bounded, insertion-ordered ring of the
//! most recently flushed events, keyed by event id, with O(1) lookup and
//! O(1) eviction of the oldest entry.
//!
//! `IndexMap` gives both properties at once — a `HashMap` alone would need
//! a side queue to track insertion order for eviction, and a `VecDeque`
//! alone would need a linear scan for id lookup.

use std::sync::Mutex;

use access_core::{EventSink, SinkError, TemporalEvent};
use async_trait::async_trait;
use indexmap::IndexMap;
use uuid::Uuid;

use crate::error::CacheError;

pub struct TemporalEventCache {
    capacity: usize,
    events: Mutex<IndexMap<Uuid, TemporalEvent>>,
}

impl TemporalEventCache {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "temporal cache capacity must be at least 1");
        Self { capacity, events: Mutex::new(IndexMap::new()) }
    }

    pub fn len(&self) -> usize {
        self.events.lock().expect("temporal cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, event_id: &Uuid) -> Option<TemporalEvent> {
        self.events.lock().expect("temporal cache mutex poisoned").get(event_id).cloned()
    }

    /// Every cached event strictly after `since`, in sequence order, not
    /// including `since` itself. `since == None` means "nothing applied
    /// yet" — the whole cache, unless the oldest entry isn't seq 1 (some
    /// earlier history was already evicted before anything could anchor on
    /// it). Returns `EventNotCached` when `since` names an id that is not
    /// present in the cache (evicted or never seen), so the caller must
    /// fall back to a full reload.
    pub fn get_all_events_since(&self, since: Option<Uuid>) -> Result<Vec<TemporalEvent>, CacheError> {
        let events = self.events.lock().expect("temporal cache mutex poisoned");
        let start_index = match since {
            None => {
                if let Some((_, oldest)) = events.first() {
                    if oldest.sequence_number != 1 {
                        return Err(CacheError::EventNotCached("<start>".to_string()));
                    }
                }
                0
            }
            Some(id) => events.get_index_of(&id).ok_or_else(|| CacheError::EventNotCached(id.to_string()))? + 1,
        };
        Ok(events.iter().skip(start_index).map(|(_, event)| event.clone()).collect())
    }
}

#[async_trait]
impl EventSink for TemporalEventCache {
    async fn apply(&self, event: &TemporalEvent) -> Result<(), SinkError> {
        let mut events = self.events.lock().expect("temporal cache mutex poisoned");
        events.insert(event.event_id, event.clone());
        while events.len() > self.capacity {
            events.shift_remove_index(0);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use access_core::{EventAction, EventPayload};
    use access_domain::UserId;
    use chrono::Utc;

    fn event(seq: i64, name: &str) -> TemporalEvent {
        TemporalEvent {
            event_id: Uuid::new_v4(),
            action: EventAction::Add,
            payload: EventPayload::User { user: UserId::new(name) },
            occurred_at: Utc::now(),
            sequence_number: seq,
        }
    }

    #[tokio::test]
    async fn evicts_oldest_once_over_capacity() {
        let cache = TemporalEventCache::new(2);
        let a = event(1, "a");
        cache.apply(&a).await.unwrap();
        cache.apply(&event(2, "b")).await.unwrap();
        cache.apply(&event(3, "c")).await.unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&a.event_id).is_none());
        let remaining = cache.get_all_events_since(Some(a.event_id));
        assert!(remaining.is_err(), "event a was evicted, so anchoring on its id must miss");
        let from_start = cache.get_all_events_since(None);
        assert!(from_start.is_err(), "the oldest surviving event isn't seq 1, so starting from scratch must miss too");
    }

    #[tokio::test]
    async fn get_all_events_since_returns_tail_in_order() {
        let cache = TemporalEventCache::new(10);
        let a = event(1, "a");
        cache.apply(&a).await.unwrap();
        cache.apply(&event(2, "b")).await.unwrap();
        cache.apply(&event(3, "c")).await.unwrap();
        let tail = cache.get_all_events_since(Some(a.event_id)).unwrap();
        let seqs: Vec<i64> = tail.iter().map(|e| e.sequence_number).collect();
        assert_eq!(seqs, vec![2, 3]);
    }

    #[tokio::test]
    async fn get_all_events_since_none_returns_everything_from_a_fresh_cache() {
        let cache = TemporalEventCache::new(10);
        cache.apply(&event(1, "a")).await.unwrap();
        cache.apply(&event(2, "b")).await.unwrap();
        let all = cache.get_all_events_since(None).unwrap();
        let seqs: Vec<i64> = all.iter().map(|e| e.sequence_number).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[tokio::test]
    async fn unknown_anchor_id_is_not_cached() {
        let cache = TemporalEventCache::new(10);
        cache.apply(&event(1, "a")).await.unwrap();
        let result = cache.get_all_events_since(Some(Uuid::new_v4()));
        assert!(result.is_err());
    }
}
