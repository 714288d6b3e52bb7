//! The per-category event buffer: ten independently-locked FIFO queues, one
//! per `EventFamily`, each holding `(payload, sequenceNumber)` pairs (here:
//! full `TemporalEvent`s, since the payload already carries its family).
//!
//! A single array of ten `Mutex<VecDeque<TemporalEvent>>`, indexed by
//! `EventFamily::index`, stands in for ten near-identical per-family
//! buffer/flush implementations.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use access_domain::AccessModel;
use chrono::Utc;
use uuid::Uuid;

use crate::event::{EventAction, EventFamily, EventPayload, TemporalEvent};
use crate::errors::CoreError;
use crate::flush_strategy::FlushStrategy;
use crate::validator::{apply_payload, EventValidator, ValidationOutcome};

const FAMILY_COUNT: usize = EventFamily::COUNT;

fn new_queues() -> [Mutex<VecDeque<TemporalEvent>>; FAMILY_COUNT] {
    std::array::from_fn(|_| Mutex::new(VecDeque::new()))
}

/// Owns the access model exclusively mutated by this writer, the ten
/// per-family queues, the global sequence counter, and the validator that
/// gates every mutation.
pub struct PerCategoryEventBuffer {
    queues: [Mutex<VecDeque<TemporalEvent>>; FAMILY_COUNT],
    model: Mutex<AccessModel>,
    validator: EventValidator,
    last_seq: AtomicI64,
    total_len: AtomicUsize,
    strategy: Box<dyn FlushStrategy>,
}

impl PerCategoryEventBuffer {
    pub fn new(model: AccessModel, validator: EventValidator, strategy: Box<dyn FlushStrategy>) -> Self {
        Self {
            queues: new_queues(),
            model: Mutex::new(model),
            validator,
            last_seq: AtomicI64::new(0),
            total_len: AtomicUsize::new(0),
            strategy,
        }
    }

    pub fn strategy(&self) -> &dyn FlushStrategy {
        self.strategy.as_ref()
    }

    pub fn last_seq(&self) -> i64 {
        self.last_seq.load(Ordering::SeqCst)
    }

    /// Read-only access to the model, for query paths on the writer side.
    pub fn model(&self) -> std::sync::MutexGuard<'_, AccessModel> {
        self.model.lock().expect("access model mutex poisoned")
    }

    /// Validates, applies, and buffers one mutation. In dependency-free mode
    /// this may recursively buffer synthetic prerequisite `Add` events
    /// first, each getting its own sequence number allocated before the
    /// dependent event's.
    pub fn submit(&self, action: EventAction, payload: EventPayload) -> Result<(), CoreError> {
        let family = payload.family();
        let lock = self.queues[family.index()].lock().expect("family mutex poisoned");
        self.submit_locked(lock, action, payload)
    }

    fn submit_locked<'a>(
        &'a self,
        mut queue: std::sync::MutexGuard<'a, VecDeque<TemporalEvent>>,
        action: EventAction,
        payload: EventPayload,
    ) -> Result<(), CoreError> {
        let mut model = self.model.lock().expect("access model mutex poisoned");
        match self.validator.check(&model, action, &payload) {
            ValidationOutcome::Reject(err) => {
                log::debug!("validator rejected {:?} {:?}: {}", action, payload.family(), err);
                Err(CoreError::Validation(err))
            }
            ValidationOutcome::Noop => Ok(()),
            ValidationOutcome::SynthesizePrerequisite(prerequisite) => {
                let pre_family = prerequisite.family();
                if pre_family == payload.family() {
                    // Same queue already locked: apply and append the
                    // prerequisite directly, still holding both locks.
                    apply_payload(&mut model, EventAction::Add, &prerequisite).map_err(CoreError::Validation)?;
                    drop(model);
                    self.append_validated(&mut queue, EventAction::Add, *prerequisite)?;
                } else {
                    drop(model);
                    let pre_lock = self.queues[pre_family.index()].lock().expect("family mutex poisoned");
                    self.submit_locked(pre_lock, EventAction::Add, *prerequisite)?;
                }
                // Retry the original mutation now that its prerequisite exists.
                self.submit_locked(queue, action, payload)
            }
            ValidationOutcome::Apply => {
                apply_payload(&mut model, action, &payload).map_err(CoreError::Validation)?;
                drop(model);
                self.append_validated(&mut queue, action, payload)?;
                Ok(())
            }
        }
    }

    /// Allocates a sequence number and appends an already-validated,
    /// already-applied event to `queue`. Caller holds `queue`'s lock.
    fn append_validated(
        &self,
        queue: &mut std::sync::MutexGuard<'_, VecDeque<TemporalEvent>>,
        action: EventAction,
        payload: EventPayload,
    ) -> Result<TemporalEvent, CoreError> {
        let seq = self.last_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let family = payload.family();
        let event = TemporalEvent { event_id: Uuid::new_v4(), action, payload, occurred_at: Utc::now(), sequence_number: seq };
        queue.push_back(event.clone());
        let total_len = self.total_len.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!("buffered {:?} seq={} family_len={}", family, seq, queue.len());
        self.strategy.record_append(family, queue.len(), total_len);
        Ok(event)
    }

    /// Current total across all families. Tracked independently of the
    /// per-family queues so it can be read without re-locking a queue whose
    /// mutex the caller may already be holding.
    pub fn total_len(&self) -> usize {
        self.total_len.load(Ordering::SeqCst)
    }

    /// Called by the flusher once it has taken `count` events out of the
    /// family queues for good (moved-back events were pushed back onto
    /// their queue and were never counted as drained).
    pub(crate) fn record_drained(&self, count: usize) {
        self.total_len.fetch_sub(count, Ordering::SeqCst);
    }

    /// Locks every family queue (one at a time, matching the flusher's
    /// contract that no two family locks are ever held together) and
    /// returns the per-family lengths. Exposed for tests/metrics.
    pub fn family_lens(&self) -> [usize; FAMILY_COUNT] {
        std::array::from_fn(|i| self.queues[i].lock().expect("family mutex poisoned").len())
    }

    pub(crate) fn queue(&self, family: EventFamily) -> &Mutex<VecDeque<TemporalEvent>> {
        &self.queues[family.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flush_strategy::SizeTriggeredFlushStrategy;
    use access_domain::{GroupId, UserId};

    fn buffer(dependency_free: bool) -> PerCategoryEventBuffer {
        PerCategoryEventBuffer::new(
            AccessModel::new(),
            EventValidator::new(crate::validator::ValidatorConfig { dependency_free }),
            Box::new(SizeTriggeredFlushStrategy::new(usize::MAX)),
        )
    }

    #[test]
    fn strict_mode_rejects_mapping_with_missing_user() {
        let buf = buffer(false);
        let err = buf
            .submit(EventAction::Add, EventPayload::UserGroup { user: UserId::new("alice"), group: GroupId::new("g1") })
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(buf.family_lens().iter().sum::<usize>(), 0);
    }

    #[test]
    fn dependency_free_mode_synthesizes_missing_prerequisites() {
        let buf = buffer(true);
        buf.submit(EventAction::Add, EventPayload::UserGroup { user: UserId::new("alice"), group: GroupId::new("g1") }).unwrap();

        assert!(buf.model().contains_user(&UserId::new("alice")));
        assert!(buf.model().contains_group(&GroupId::new("g1")));

        let lens = buf.family_lens();
        assert_eq!(lens[EventFamily::User.index()], 1);
        assert_eq!(lens[EventFamily::Group.index()], 1);
        assert_eq!(lens[EventFamily::UserGroup.index()], 1);
        assert_eq!(buf.last_seq(), 3);
    }

    #[test]
    fn dependency_free_mode_duplicate_add_is_a_noop() {
        let buf = buffer(true);
        buf.submit(EventAction::Add, EventPayload::User { user: UserId::new("alice") }).unwrap();
        buf.submit(EventAction::Add, EventPayload::User { user: UserId::new("alice") }).unwrap();
        assert_eq!(buf.last_seq(), 1);
        assert_eq!(buf.family_lens()[EventFamily::User.index()], 1);
    }
}
