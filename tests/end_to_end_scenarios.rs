//! End-to-end scenarios spanning the write path (buffer, flush, persister,
//! cache) and the read path (reader replica, refresh loop), wired the same
//! way `access-manager`'s own binary wires them.

use std::sync::{Arc, Mutex};

use access_cache::{PersisterDistributor, ReaderRefreshLoop, TemporalEventCache};
use access_core::{
    EventAction, EventPayload, EventSink, EventValidator, KWayMergeFlusher, PerCategoryEventBuffer, SizeTriggeredFlushStrategy,
    ValidatorConfig,
};
use access_domain::{AccessModel, ComponentAccess, GroupId, UserId};
use access_providers::{InMemoryPersister, Persister};

fn wired_buffer() -> PerCategoryEventBuffer {
    PerCategoryEventBuffer::new(
        AccessModel::new(),
        EventValidator::new(ValidatorConfig::default()),
        Box::new(SizeTriggeredFlushStrategy::new(usize::MAX)),
    )
}

/// S1: a user mapped into a group that holds a component grant can see it
/// transitively, end to end through buffer -> flush -> persister/cache.
#[tokio::test]
async fn happy_path_flush_and_query() {
    let buffer = wired_buffer();
    buffer.submit(EventAction::Add, EventPayload::User { user: UserId::new("alice") }).unwrap();
    buffer.submit(EventAction::Add, EventPayload::Group { group: GroupId::new("engineering") }).unwrap();
    buffer
        .submit(EventAction::Add, EventPayload::UserGroup { user: UserId::new("alice"), group: GroupId::new("engineering") })
        .unwrap();
    buffer
        .submit(
            EventAction::Add,
            EventPayload::GroupComponent {
                group: GroupId::new("engineering"),
                access: ComponentAccess::new("billing", "read"),
            },
        )
        .unwrap();

    let persister = Arc::new(InMemoryPersister::new());
    let cache = Arc::new(TemporalEventCache::new(64));
    let distributor: Arc<dyn EventSink> =
        Arc::new(PersisterDistributor::new(vec![persister.clone() as Arc<dyn EventSink>, cache.clone() as Arc<dyn EventSink>]));
    let flusher = KWayMergeFlusher::new(vec![distributor]);
    let metrics = flusher.flush(&buffer).await.unwrap();
    assert_eq!(metrics.flushed_count, 4);

    let mut replica = AccessModel::new();
    persister.load(&mut replica).await.unwrap();
    assert!(replica
        .has_access_to_application_component(&UserId::new("alice"), &ComponentAccess::new("billing", "read"))
        .unwrap());
}

/// S2: adding an edge that would create a cycle is rejected and never
/// makes it into the buffer or the durable log.
#[test]
fn cycle_rejection_never_reaches_the_buffer() {
    let buffer = wired_buffer();
    buffer.submit(EventAction::Add, EventPayload::Group { group: GroupId::new("a") }).unwrap();
    buffer.submit(EventAction::Add, EventPayload::Group { group: GroupId::new("b") }).unwrap();
    buffer.submit(EventAction::Add, EventPayload::GroupGroup { child: GroupId::new("b"), parent: GroupId::new("a") }).unwrap();

    let err = buffer
        .submit(EventAction::Add, EventPayload::GroupGroup { child: GroupId::new("a"), parent: GroupId::new("b") })
        .unwrap_err();
    assert!(matches!(err, access_core::CoreError::Validation(access_domain::DomainError::CircularReference(_, _))));

    // Only the three successful mutations (two groups, one edge) were buffered.
    assert_eq!(buffer.family_lens().iter().sum::<usize>(), 3);
}

/// S3/S4: events appended to a family queue after a flush's high-water
/// mark was captured are moved back, not flushed early, and are picked up
/// by the next flush in their original order.
#[tokio::test]
async fn events_past_the_high_water_mark_flush_on_the_next_pass() {
    let buffer = wired_buffer();
    buffer.submit(EventAction::Add, EventPayload::User { user: UserId::new("alice") }).unwrap();

    let sink_calls = Arc::new(Mutex::new(Vec::new()));
    struct RecordingSink(Arc<Mutex<Vec<i64>>>);
    #[async_trait::async_trait]
    impl EventSink for RecordingSink {
        async fn apply(&self, event: &access_core::TemporalEvent) -> Result<(), access_core::SinkError> {
            self.0.lock().unwrap().push(event.sequence_number);
            Ok(())
        }
    }
    let sink: Arc<dyn EventSink> = Arc::new(RecordingSink(sink_calls.clone()));
    let flusher = KWayMergeFlusher::new(vec![sink]);

    let first_metrics = flusher.flush(&buffer).await.unwrap();
    assert_eq!(first_metrics.flushed_count, 1);

    buffer.submit(EventAction::Add, EventPayload::User { user: UserId::new("bob") }).unwrap();
    let second_metrics = flusher.flush(&buffer).await.unwrap();
    assert_eq!(second_metrics.flushed_count, 1);

    assert_eq!(*sink_calls.lock().unwrap(), vec![1, 2]);
}

/// S5: once the temporal cache has evicted the tail a reader needs, the
/// refresh loop falls back to a full reload from the persister rather than
/// serving stale state forever.
#[tokio::test]
async fn reader_catches_up_via_persister_fallback_on_cache_miss() {
    let persister = Arc::new(InMemoryPersister::new());
    let cache = Arc::new(TemporalEventCache::new(1));

    let buffer = wired_buffer();
    buffer.submit(EventAction::Add, EventPayload::User { user: UserId::new("alice") }).unwrap();
    buffer.submit(EventAction::Add, EventPayload::User { user: UserId::new("bob") }).unwrap();
    let distributor: Arc<dyn EventSink> =
        Arc::new(PersisterDistributor::new(vec![persister.clone() as Arc<dyn EventSink>, cache.clone() as Arc<dyn EventSink>]));
    KWayMergeFlusher::new(vec![distributor]).flush(&buffer).await.unwrap();

    // The cache (capacity 1) only retained the newest event.
    assert_eq!(cache.len(), 1);

    let reader_model = Arc::new(Mutex::new(AccessModel::new()));
    let refresh = ReaderRefreshLoop::new(reader_model.clone(), cache, persister);
    refresh.tick().await;

    let model = reader_model.lock().unwrap();
    assert!(model.contains_user(&UserId::new("alice")));
    assert!(model.contains_user(&UserId::new("bob")));
}

/// S6: a flush that cannot reach the persister trips the switch, and the
/// trip is permanent for the process's lifetime.
#[tokio::test]
async fn flush_failure_trips_the_switch() {
    use access_infra::{InterceptMode, TripSwitch};

    struct FailingSink;
    #[async_trait::async_trait]
    impl EventSink for FailingSink {
        async fn apply(&self, _event: &access_core::TemporalEvent) -> Result<(), access_core::SinkError> {
            Err(access_core::SinkError::new("durable store unreachable"))
        }
    }

    let buffer = wired_buffer();
    buffer.submit(EventAction::Add, EventPayload::User { user: UserId::new("alice") }).unwrap();

    let flusher = KWayMergeFlusher::new(vec![Arc::new(FailingSink) as Arc<dyn EventSink>]);
    let trip_switch = TripSwitch::new(InterceptMode::FailFast);

    match flusher.flush(&buffer).await {
        Ok(_) => panic!("expected the flush to fail"),
        Err(e) => trip_switch.trip(&e.to_string()),
    }

    assert!(trip_switch.is_tripped());
    assert!(trip_switch.check().is_err());
}
