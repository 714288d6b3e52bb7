//! The reader refresh loop.
//!
//! A reader holds its own `AccessModel` replica and periodically pulls
//! everything the temporal cache has accumulated since the last refresh,
//! applying it locally. If the cache has already evicted the tail the
//! reader needs (`EventNotCached`), the loop falls back to a full reload
//! from the persister rather than serving stale data forever.
//!
//! Errors encountered off the query path (inside the background tick) are
//! not returned anywhere — nothing is polling this loop's return value.
//! Instead the error is stashed and re-raised the next time a query method
//! is called, so a caller eventually learns the reader is unhealthy instead
//! of silently reading frozen state. `notify_query_method_called` implements
//! that half of the contract.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use access_core::apply_payload;
use access_domain::AccessModel;
use access_providers::Persister;
use thiserror::Error;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::CacheError;
use crate::temporal_cache::TemporalEventCache;

#[derive(Debug, Error, Clone)]
pub enum ReaderRefreshError {
    #[error("cache miss during refresh: {0}")]
    CacheMiss(#[from] CacheError),
    #[error("persister error during fallback reload: {0}")]
    Persister(String),
    #[error("applying cached event to reader replica failed: {0}")]
    Apply(String),
}

pub struct ReaderRefreshLoop {
    model: Arc<Mutex<AccessModel>>,
    cache: Arc<TemporalEventCache>,
    persister: Arc<dyn Persister>,
    /// The id of the last event applied to the replica — the anchor the
    /// temporal cache keys its lookups on. `None` means nothing has been
    /// applied yet, so the next tick asks the cache for everything it has.
    last_applied_id: Mutex<Option<Uuid>>,
    /// Mirrors `last_applied_id`'s sequence number, kept only so callers
    /// (metrics, tests) can read a progress counter without needing the id.
    last_applied_seq: AtomicI64,
    pending_error: Mutex<Option<ReaderRefreshError>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl ReaderRefreshLoop {
    pub fn new(model: Arc<Mutex<AccessModel>>, cache: Arc<TemporalEventCache>, persister: Arc<dyn Persister>) -> Arc<Self> {
        Arc::new(Self {
            model,
            cache,
            persister,
            last_applied_id: Mutex::new(None),
            last_applied_seq: AtomicI64::new(0),
            pending_error: Mutex::new(None),
            ticker: Mutex::new(None),
        })
    }

    /// Spawns the background tick loop on `period`. The returned task is
    /// also stored on `self` so `shutdown` can cancel it.
    pub fn spawn(self: &Arc<Self>, period: Duration) {
        let this = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                this.tick().await;
            }
        });
        *self.ticker.lock().expect("ticker mutex poisoned") = Some(handle);
    }

    pub fn shutdown(&self) {
        if let Some(handle) = self.ticker.lock().expect("ticker mutex poisoned").take() {
            handle.abort();
        }
    }

    /// One refresh cycle: pull everything newer than the last applied
    /// event's id from the cache, or fall back to a full persister reload
    /// on a cache miss (the anchor was evicted, or nothing has been
    /// applied yet and the cache's own history doesn't start from scratch).
    pub async fn tick(&self) {
        let anchor = *self.last_applied_id.lock().expect("last applied id mutex poisoned");
        match self.cache.get_all_events_since(anchor) {
            Ok(events) => {
                if events.is_empty() {
                    return;
                }
                let mut model = self.model.lock().expect("reader model mutex poisoned");
                for event in &events {
                    if let Err(e) = apply_payload(&mut model, event.action, &event.payload) {
                        self.set_error(ReaderRefreshError::Apply(e.to_string()));
                        return;
                    }
                    *self.last_applied_id.lock().expect("last applied id mutex poisoned") = Some(event.event_id);
                    self.last_applied_seq.store(event.sequence_number, Ordering::SeqCst);
                }
                log::debug!("reader refreshed to seq={}", self.last_applied_seq.load(Ordering::SeqCst));
            }
            Err(miss) => {
                log::warn!("temporal cache miss during reader refresh, falling back to full reload: {miss}");
                self.full_reload().await;
            }
        }
    }

    async fn full_reload(&self) {
        let mut fresh = AccessModel::new();
        match self.persister.load(&mut fresh).await {
            Ok(last) => {
                let mut model = self.model.lock().expect("reader model mutex poisoned");
                *model = fresh;
                let (id, seq) = match last {
                    Some((id, _, seq)) => (Some(id), seq),
                    None => (None, 0),
                };
                *self.last_applied_id.lock().expect("last applied id mutex poisoned") = id;
                self.last_applied_seq.store(seq, Ordering::SeqCst);
            }
            Err(e) => self.set_error(ReaderRefreshError::Persister(e.to_string())),
        }
    }

    fn set_error(&self, error: ReaderRefreshError) {
        *self.pending_error.lock().expect("pending error mutex poisoned") = Some(error);
    }

    /// Re-raises and clears any error stashed by the background loop since
    /// the last call. Reader query methods call this before reading the
    /// model, so a background failure surfaces on the caller's next query
    /// rather than vanishing silently.
    pub fn notify_query_method_called(&self) -> Result<(), ReaderRefreshError> {
        match self.pending_error.lock().expect("pending error mutex poisoned").take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn last_applied(&self) -> i64 {
        self.last_applied_seq.load(Ordering::SeqCst)
    }
}

impl Drop for ReaderRefreshLoop {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use access_core::{EventAction, EventPayload, EventSink};
    use access_domain::UserId;
    use access_providers::InMemoryPersister;
    use chrono::Utc;

    fn event(seq: i64, name: &str) -> access_core::TemporalEvent {
        access_core::TemporalEvent {
            event_id: Uuid::new_v4(),
            action: EventAction::Add,
            payload: EventPayload::User { user: UserId::new(name) },
            occurred_at: Utc::now(),
            sequence_number: seq,
        }
    }

    #[tokio::test]
    async fn tick_applies_new_cached_events() {
        let cache = Arc::new(TemporalEventCache::new(10));
        cache.apply(&event(1, "alice")).await.unwrap();
        let persister = Arc::new(InMemoryPersister::new());
        let model = Arc::new(Mutex::new(AccessModel::new()));
        let refresh = ReaderRefreshLoop::new(model.clone(), cache.clone(), persister);

        refresh.tick().await;

        assert!(model.lock().unwrap().contains_user(&UserId::new("alice")));
        assert_eq!(refresh.last_applied(), 1);
        assert!(refresh.notify_query_method_called().is_ok());
    }

    #[tokio::test]
    async fn cache_miss_triggers_full_reload_from_persister() {
        let persister = Arc::new(InMemoryPersister::new());
        persister.apply(&event(1, "alice")).await.unwrap();
        persister.apply(&event(2, "bob")).await.unwrap();

        // Cache only has the tail; a reader starting from 0 must miss.
        let cache = Arc::new(TemporalEventCache::new(1));
        cache.apply(&event(2, "bob")).await.unwrap();

        let model = Arc::new(Mutex::new(AccessModel::new()));
        let refresh = ReaderRefreshLoop::new(model.clone(), cache, persister);

        refresh.tick().await;

        assert!(model.lock().unwrap().contains_user(&UserId::new("alice")));
        assert!(model.lock().unwrap().contains_user(&UserId::new("bob")));
        assert_eq!(refresh.last_applied(), 2);
    }
}
