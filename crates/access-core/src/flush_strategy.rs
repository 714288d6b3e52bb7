//! Flush triggering: decides *when* the flusher should run, never *how*.
//! Two strategies, size- and interval-triggered, both communicate "time to
//! flush" through an `Arc<tokio::sync::Notify>`, whose single-permit
//! semantics naturally coalesce bursts of triggers into one wakeup.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::event::EventFamily;

/// Called by the buffer on every successful append; implementations decide
/// whether this append should wake the flush loop.
pub trait FlushStrategy: Send + Sync {
    fn record_append(&self, family: EventFamily, family_len: usize, total_len: usize);

    /// The shared signal the flush loop awaits on.
    fn notify(&self) -> Arc<Notify>;
}

/// Triggers a flush once the buffer's total length crosses `threshold`.
pub struct SizeTriggeredFlushStrategy {
    threshold: usize,
    notify: Arc<Notify>,
}

impl SizeTriggeredFlushStrategy {
    pub fn new(threshold: usize) -> Self {
        Self { threshold: threshold.max(1), notify: Arc::new(Notify::new()) }
    }
}

impl FlushStrategy for SizeTriggeredFlushStrategy {
    fn record_append(&self, _family: EventFamily, _family_len: usize, total_len: usize) {
        if total_len >= self.threshold {
            self.notify.notify_one();
        }
    }

    fn notify(&self) -> Arc<Notify> {
        self.notify.clone()
    }
}

/// Triggers a flush on a fixed tick, regardless of buffer occupancy.
/// Spawns a background tokio task on construction; `shutdown` cancels it.
pub struct IntervalTriggeredFlushStrategy {
    notify: Arc<Notify>,
    ticker: JoinHandle<()>,
    appended_since_tick: AtomicUsize,
}

impl IntervalTriggeredFlushStrategy {
    pub fn new(period: Duration) -> Self {
        let notify = Arc::new(Notify::new());
        let ticker_notify = notify.clone();
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await; // first tick fires immediately; discard it
            loop {
                interval.tick().await;
                ticker_notify.notify_one();
            }
        });
        Self { notify, ticker, appended_since_tick: AtomicUsize::new(0) }
    }

    pub fn shutdown(&self) {
        self.ticker.abort();
    }
}

impl Drop for IntervalTriggeredFlushStrategy {
    fn drop(&mut self) {
        self.ticker.abort();
    }
}

impl FlushStrategy for IntervalTriggeredFlushStrategy {
    fn record_append(&self, _family: EventFamily, _family_len: usize, _total_len: usize) {
        self.appended_since_tick.fetch_add(1, Ordering::Relaxed);
    }

    fn notify(&self) -> Arc<Notify> {
        self.notify.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn size_strategy_notifies_at_threshold() {
        let strategy = SizeTriggeredFlushStrategy::new(3);
        strategy.record_append(EventFamily::User, 1, 1);
        strategy.record_append(EventFamily::User, 2, 2);
        strategy.record_append(EventFamily::User, 3, 3);
        // A permit was stored by the third record_append; this must not block.
        tokio::time::timeout(Duration::from_millis(50), strategy.notify().notified())
            .await
            .expect("threshold crossing should have notified");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn interval_strategy_ticks() {
        let strategy = IntervalTriggeredFlushStrategy::new(Duration::from_millis(20));
        let notify = strategy.notify();
        tokio::time::timeout(Duration::from_millis(500), notify.notified()).await.expect("interval should have fired");
        strategy.shutdown();
    }
}
