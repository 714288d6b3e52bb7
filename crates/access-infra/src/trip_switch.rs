//! The trip switch: a one-way latch that contains a failure once the
//! writer can no longer guarantee durability (a flush that can't reach the
//! persister).
//!
//! Tripping is irreversible for the lifetime of the process — there is no
//! reset, by design: a trip means the in-memory buffer and the durable
//! store have diverged and nothing short of a restart (and a fresh load
//! from the persister) should be trusted to reconcile them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

/// How a trip should affect the request that discovers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptMode {
    /// Reject the triggering request immediately (and every request after
    /// it) once tripped.
    FailFast,
    /// Let the triggering request finish normally; schedule a delayed
    /// shutdown instead of failing it outright.
    DelayedShutdown { after: Duration },
}

pub struct TripSwitch {
    tripped: AtomicBool,
    mode: InterceptMode,
    on_trip: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    shutdown: Mutex<Option<tokio::task::JoinHandle<()>>>,
    self_ref: Weak<TripSwitch>,
}

impl TripSwitch {
    pub fn new(mode: InterceptMode) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            tripped: AtomicBool::new(false),
            mode,
            on_trip: Mutex::new(None),
            shutdown: Mutex::new(None),
            self_ref: self_ref.clone(),
        })
    }

    /// Registers a callback to run exactly once, the first time `trip` is
    /// called. Replaces any previously-registered callback.
    pub fn on_trip(&self, callback: impl FnOnce() + Send + 'static) {
        *self.on_trip.lock().expect("on_trip mutex poisoned") = Some(Box::new(callback));
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }

    /// Trips the switch. Idempotent: only the first call runs the
    /// callback and, in `DelayedShutdown` mode, schedules the shutdown
    /// task. Under `DelayedShutdown`, the triggering request is not
    /// rethrown to — it is served normally, and shutdown happens on its
    /// own timer regardless of how the request concludes.
    pub fn trip(&self, reason: &str) {
        if self.tripped.swap(true, Ordering::SeqCst) {
            return;
        }
        log::error!("trip switch actuated: {reason}");
        if let Some(callback) = self.on_trip.lock().expect("on_trip mutex poisoned").take() {
            callback();
        }
        if let InterceptMode::DelayedShutdown { after } = self.mode {
            let Some(this) = self.self_ref.upgrade() else { return };
            let handle = tokio::spawn(async move {
                tokio::time::sleep(after).await;
                log::error!("trip switch delayed shutdown firing now");
                this.run_shutdown();
            });
            *self.shutdown.lock().expect("shutdown mutex poisoned") = Some(handle);
        }
    }

    fn run_shutdown(&self) {
        std::process::exit(1);
    }

    /// Call at the top of every request handler. `FailFast` mode rejects
    /// once tripped; `DelayedShutdown` mode never rejects here — the
    /// request runs to completion and shutdown proceeds on its own clock.
    pub fn check(&self) -> Result<(), TripSwitchActuated> {
        if self.tripped.load(Ordering::SeqCst) && self.mode == InterceptMode::FailFast {
            return Err(TripSwitchActuated);
        }
        Ok(())
    }

    pub fn cancel_pending_shutdown(&self) {
        if let Some(handle) = self.shutdown.lock().expect("shutdown mutex poisoned").take() {
            handle.abort();
        }
    }
}

impl Drop for TripSwitch {
    fn drop(&mut self) {
        self.cancel_pending_shutdown();
    }
}

#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("trip switch has actuated; this node is no longer accepting requests")]
pub struct TripSwitchActuated;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn trip_runs_callback_at_most_once() {
        let switch = TripSwitch::new(InterceptMode::FailFast);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        switch.on_trip(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        switch.trip("first failure");
        switch.trip("second failure");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(switch.is_tripped());
    }

    #[test]
    fn fail_fast_rejects_once_tripped() {
        let switch = TripSwitch::new(InterceptMode::FailFast);
        assert!(switch.check().is_ok());
        switch.trip("boom");
        assert!(switch.check().is_err());
    }

    #[tokio::test]
    async fn delayed_shutdown_does_not_reject_the_triggering_request() {
        let switch = TripSwitch::new(InterceptMode::DelayedShutdown { after: Duration::from_secs(3600) });
        switch.trip("boom");
        // The request that discovered the trip is still served normally.
        assert!(switch.check().is_ok());
        assert!(switch.is_tripped());
        switch.cancel_pending_shutdown();
    }
}
