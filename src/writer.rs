//! The writer node: wires the validator, per-category buffer, flush
//! strategy, k-way merge flusher, persister, temporal cache, and trip
//! switch into one unit that accepts mutations and periodically durably
//! commits them.

use std::sync::Arc;
use std::time::Duration;

use access_cache::{PersisterDistributor, TemporalEventCache};
use access_core::{
    CoreError, EventAction, EventPayload, EventSink, EventValidator, IntervalTriggeredFlushStrategy, KWayMergeFlusher,
    PerCategoryEventBuffer, SizeTriggeredFlushStrategy, ValidatorConfig,
};
use access_domain::AccessModel;
use access_infra::TripSwitch;
use access_providers::Persister;
use tokio::task::JoinHandle;

use crate::config::EngineConfig;

pub struct WriterNode {
    buffer: Arc<PerCategoryEventBuffer>,
    flusher: KWayMergeFlusher,
    trip_switch: Arc<TripSwitch>,
    flush_loop: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl WriterNode {
    /// `persister` is the durable store; `cache` is shared with whatever
    /// reader nodes this writer's readers refresh from. Generic over the
    /// concrete persister type so constructing the `EventSink` fan-out
    /// below is a plain sized-to-trait-object coercion rather than an
    /// upcast between two trait objects.
    pub fn new<P: Persister + 'static>(config: &EngineConfig, persister: Arc<P>, cache: Arc<TemporalEventCache>) -> Arc<Self> {
        let strategy: Box<dyn access_core::FlushStrategy> = if config.flush_threshold > 0 {
            Box::new(SizeTriggeredFlushStrategy::new(config.flush_threshold))
        } else {
            Box::new(IntervalTriggeredFlushStrategy::new(config.flush_interval))
        };

        let buffer = Arc::new(PerCategoryEventBuffer::new(
            AccessModel::new(),
            EventValidator::new(ValidatorConfig { dependency_free: config.dependency_free }),
            strategy,
        ));

        let distributor: Arc<dyn EventSink> =
            Arc::new(PersisterDistributor::new(vec![persister as Arc<dyn EventSink>, cache as Arc<dyn EventSink>]));
        let flusher = KWayMergeFlusher::new(vec![distributor]);

        let trip_switch = TripSwitch::new(config.trip_mode);

        Arc::new(Self { buffer, flusher, trip_switch, flush_loop: std::sync::Mutex::new(None) })
    }

    pub fn trip_switch(&self) -> Arc<TripSwitch> {
        self.trip_switch.clone()
    }

    /// Validates, applies, and buffers one mutation. Rejects outright if
    /// the trip switch has actuated in fail-fast mode.
    pub fn submit(&self, action: EventAction, payload: EventPayload) -> Result<(), CoreError> {
        self.trip_switch.check().map_err(|e| CoreError::Internal(e.to_string()))?;
        self.buffer.submit(action, payload)
    }

    /// Runs one flush cycle. A failure here trips the switch — once a
    /// flush cannot reach the persister, this writer's in-memory state and
    /// the durable log have no reconciled relationship worth trusting.
    pub async fn flush_once(&self) -> Result<access_core::FlushMetrics, CoreError> {
        match self.flusher.flush(&self.buffer).await {
            Ok(metrics) => Ok(metrics),
            Err(err) => {
                self.trip_switch.trip(&err.to_string());
                Err(err)
            }
        }
    }

    /// Spawns a background task that flushes on `period`, forever (until
    /// `shutdown`). Most deployments pair a size-triggered buffer strategy
    /// with an interval-triggered flush loop so neither an idle period nor
    /// a burst leaves data unflushed for long.
    pub fn spawn_flush_loop(self: &Arc<Self>, period: Duration) {
        let this = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                if this.trip_switch.is_tripped() {
                    continue;
                }
                if let Err(e) = this.flush_once().await {
                    log::error!("scheduled flush failed: {e}");
                }
            }
        });
        *self.flush_loop.lock().expect("flush loop mutex poisoned") = Some(handle);
    }

    pub fn shutdown(&self) {
        if let Some(handle) = self.flush_loop.lock().expect("flush loop mutex poisoned").take() {
            handle.abort();
        }
    }
}

impl Drop for WriterNode {
    fn drop(&mut self) {
        self.shutdown();
    }
}
