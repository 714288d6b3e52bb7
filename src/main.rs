//! Demo wiring: one writer node and one reader node sharing a persister and
//! a temporal cache, replaying the happy-path scenario from the access
//! model's test suite end to end.

use std::sync::Arc;
use std::time::Duration;

use access_cache::TemporalEventCache;
use access_core::{EventAction, EventPayload};
use access_domain::{GroupId, UserId};
use access_manager::{EngineConfig, ReaderNode, WriterNode};
use access_providers::InMemoryPersister;

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = EngineConfig::from_env();
    let persister = Arc::new(InMemoryPersister::new());
    let cache = Arc::new(TemporalEventCache::new(config.cache_capacity));

    let writer = WriterNode::new(&config, persister.clone(), cache.clone());
    writer.spawn_flush_loop(config.flush_interval);

    writer.submit(EventAction::Add, EventPayload::User { user: UserId::new("alice") }).expect("add user");
    writer.submit(EventAction::Add, EventPayload::Group { group: GroupId::new("engineering") }).expect("add group");
    writer
        .submit(EventAction::Add, EventPayload::UserGroup { user: UserId::new("alice"), group: GroupId::new("engineering") })
        .expect("map user to group");

    writer.flush_once().await.expect("initial flush");

    let reader = ReaderNode::new(cache, persister);
    reader.spawn_refresh_loop(config.reader_refresh_interval);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let component = access_domain::ComponentAccess::new("billing", "read");
    match reader.has_access_to_application_component(&UserId::new("alice"), &component) {
        Ok(has_access) => println!("alice has billing:read access: {has_access}"),
        Err(e) => println!("query failed: {e}"),
    }

    writer.shutdown();
    reader.shutdown();
}
