//! Change Scheduler
//!
//! Decides, per document, whether an edit notification is the echo of our
//! own write (suppressed) or a real edit (queued for the next sweep).
//!
//! Per document the state is `Idle`, `SuppressPending` or `Queued`:
//! - a completed write moves `Idle` to `SuppressPending`
//! - the next edit notification moves `SuppressPending` back to `Idle`
//! - any other edit notification queues the document, once
//! - a failed write whose mark was already consumed queues the document again
//! - a sweep takes every queued document and empties the queue

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Scheduling state of one document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocState {
    Idle,
    SuppressPending,
    Queued,
}

/// What an edit notification did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The notification was the echo of our own write and was consumed
    Suppressed,
    Queued,
    /// The document was already waiting for the next sweep
    AlreadyQueued,
}

#[derive(Debug)]
struct Sets<K> {
    pending: HashSet<K>,
    suppressed: HashSet<K>,
}

/// Pending and suppression sets for one session.
///
/// The lock is only held for set operations, never across an await.
#[derive(Debug)]
pub struct ChangeScheduler<K> {
    sets: Mutex<Sets<K>>,
}

impl<K> Default for ChangeScheduler<K> {
    fn default() -> Self {
        Self {
            sets: Mutex::new(Sets {
                pending: HashSet::new(),
                suppressed: HashSet::new(),
            }),
        }
    }
}

impl<K: Eq + Hash + Clone + Debug> ChangeScheduler<K> {
    pub fn new() -> Self {
        Self::default()
    }

    fn sets(&self) -> MutexGuard<'_, Sets<K>> {
        // The sets stay consistent after every single operation, so a poisoned lock is still usable
        self.sets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handle an edit notification for `id`
    pub fn on_edit(&self, id: &K) -> EditOutcome {
        let mut sets = self.sets();

        if sets.suppressed.remove(id) {
            log::debug!("Ignoring echo of our own write to {:?}", id);
            return EditOutcome::Suppressed;
        }

        if sets.pending.insert(id.clone()) {
            log::debug!("Queued {:?} for the next sweep", id);
            EditOutcome::Queued
        } else {
            EditOutcome::AlreadyQueued
        }
    }

    /// Treat the next edit notification for `id` as the echo of our write
    pub fn expect_echo(&self, id: K) {
        self.sets().suppressed.insert(id);
    }

    /// Withdraw an echo expectation, e.g. after the write failed
    pub fn cancel_echo(&self, id: &K) -> bool {
        self.sets().suppressed.remove(id)
    }

    /// Queue `id` for the next sweep without consuming a suppression
    pub fn requeue(&self, id: K) {
        log::debug!("Requeued {:?} after a failed write", id);
        self.sets().pending.insert(id);
    }

    /// Take every queued document and empty the queue in one step.
    ///
    /// Edits that arrive after this call queue their document for the next sweep.
    pub fn take_pending(&self) -> Vec<K> {
        std::mem::take(&mut self.sets().pending)
            .into_iter()
            .collect()
    }

    pub fn state(&self, id: &K) -> DocState {
        let sets = self.sets();
        if sets.pending.contains(id) {
            DocState::Queued
        } else if sets.suppressed.contains(id) {
            DocState::SuppressPending
        } else {
            DocState::Idle
        }
    }

    pub fn pending_len(&self) -> usize {
        self.sets().pending.len()
    }

    /// Forget all state, ending the session
    pub fn clear(&self) {
        let mut sets = self.sets();
        sets.pending.clear();
        sets.suppressed.clear();
    }
}
