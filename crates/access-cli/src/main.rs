//! access-cli: a small standalone demonstration of the write path (buffer,
//! flush, persister, cache) and the read path (reader replica, refresh
//! loop) wired together end to end, in a single process.
//!
//! For the configurable, trip-switch-guarded node wiring see the root
//! `access-manager` binary.

use std::sync::{Arc, Mutex};

use access_cache::{PersisterDistributor, ReaderRefreshLoop, TemporalEventCache};
use access_core::{EventAction, EventPayload, EventSink, EventValidator, KWayMergeFlusher, PerCategoryEventBuffer, SizeTriggeredFlushStrategy, ValidatorConfig};
use access_domain::{AccessModel, GroupId, UserId};
use access_providers::InMemoryPersister;

#[tokio::main]
async fn main() {
    env_logger::init();

    let persister = Arc::new(InMemoryPersister::new());
    let cache = Arc::new(TemporalEventCache::new(256));
    let distributor: Arc<dyn EventSink> = Arc::new(PersisterDistributor::new(vec![
        persister.clone() as Arc<dyn EventSink>,
        cache.clone() as Arc<dyn EventSink>,
    ]));

    let buffer = PerCategoryEventBuffer::new(
        AccessModel::new(),
        EventValidator::new(ValidatorConfig::default()),
        Box::new(SizeTriggeredFlushStrategy::new(4)),
    );

    buffer.submit(EventAction::Add, EventPayload::User { user: UserId::new("alice") }).expect("add user");
    buffer.submit(EventAction::Add, EventPayload::Group { group: GroupId::new("engineering") }).expect("add group");
    buffer
        .submit(EventAction::Add, EventPayload::UserGroup { user: UserId::new("alice"), group: GroupId::new("engineering") })
        .expect("map user to group");

    let flusher = KWayMergeFlusher::new(vec![distributor]);
    let metrics = flusher.flush(&buffer).await.expect("flush");
    println!("flushed {} events in {:?}", metrics.flushed_count, metrics.duration);

    let reader_model = Arc::new(Mutex::new(AccessModel::new()));
    let refresh = ReaderRefreshLoop::new(reader_model.clone(), cache, persister);
    refresh.tick().await;
    refresh.notify_query_method_called().expect("reader is healthy");

    let model = reader_model.lock().expect("reader model mutex poisoned");
    println!("reader replica has alice: {}", model.contains_user(&UserId::new("alice")));
    println!("reader caught up to sequence {}", refresh.last_applied());
}
