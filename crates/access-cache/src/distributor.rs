//! The persister distributor: fans one flushed event out to every
//! registered consumer, sequentially.

use std::sync::Arc;

use access_core::{EventSink, SinkError, TemporalEvent};
use async_trait::async_trait;

pub struct PersisterDistributor {
    consumers: Vec<Arc<dyn EventSink>>,
}

impl PersisterDistributor {
    pub fn new(consumers: Vec<Arc<dyn EventSink>>) -> Self {
        Self { consumers }
    }
}

#[async_trait]
impl EventSink for PersisterDistributor {
    async fn apply(&self, event: &TemporalEvent) -> Result<(), SinkError> {
        for consumer in &self.consumers {
            consumer.apply(event).await?;
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
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct CountingSink(AtomicUsize);

    #[async_trait]
    impl EventSink for CountingSink {
        async fn apply(&self, _event: &TemporalEvent) -> Result<(), SinkError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn every_registered_consumer_is_dispatched_to() {
        let a = Arc::new(CountingSink(AtomicUsize::new(0)));
        let b = Arc::new(CountingSink(AtomicUsize::new(0)));
        let c = Arc::new(CountingSink(AtomicUsize::new(0)));
        let distributor = PersisterDistributor::new(vec![a.clone(), b.clone(), c.clone()]);

        let event = TemporalEvent {
            event_id: Uuid::new_v4(),
            action: EventAction::Add,
            payload: EventPayload::User { user: UserId::new("alice") },
            occurred_at: Utc::now(),
            sequence_number: 1,
        };
        distributor.apply(&event).await.unwrap();

        assert_eq!(a.0.load(Ordering::SeqCst), 1);
        assert_eq!(b.0.load(Ordering::SeqCst), 1);
        assert_eq!(c.0.load(Ordering::SeqCst), 1);
    }
}
