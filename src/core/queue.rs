//! The command ordering engine.
//!
//! [`CommandQueue`] owns the pending/running/completed lists behind a single
//! mutex; every operation is one critical section, so concurrent callers see
//! a consistent total order of effects. The queue never executes anything.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::core::command::{Command, CommandPriority};

/// Result of enqueuing a command, for diagnostics and assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnqueueResult {
    /// Id of the enqueued command.
    pub command_id: String,
    /// Resulting pending-list index, or `-1` when the command was merged
    /// away by successive dedupe.
    pub position: isize,
    /// Whether successive dedupe consumed the command.
    pub deduplicated: bool,
}

/// Monotonic traffic counters, maintained inside the queue's critical
/// section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Commands inserted into pending.
    pub enqueued: u64,
    /// Commands consumed by successive dedupe (dropped or merged).
    pub deduplicated: u64,
    /// Subset of `deduplicated` where the incoming command replaced the
    /// pending tail because it carried a strictly higher priority.
    pub replaced: u64,
    /// Successful `start_running` claims.
    pub started: u64,
    /// Successful `finish_running` completions.
    pub completed: u64,
}

#[derive(Default)]
struct QueueInner {
    pending: Vec<Arc<dyn Command>>,
    running: Vec<Arc<dyn Command>>,
    completed: Vec<Arc<dyn Command>>,
    stats: QueueStats,
}

/// In-memory, non-executing command queue with priority ordering,
/// affinity-aware insertion, and successive fingerprint dedupe.
///
/// Ordering rules, applied at `enqueue` time only:
/// - `Highest` priority always goes to index 0.
/// - Otherwise a command is placed before the first pending entry of
///   strictly lower priority whose affinity differs, or whose affinity
///   matches but is not represented in the running list.
/// - A command fingerprint-identical to the pending tail is merged: the
///   higher-priority of the two survives.
pub struct CommandQueue {
    inner: Mutex<QueueInner>,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner::default()),
        }
    }

    /// Enqueue a command, returning its placement.
    ///
    /// Applies successive dedupe against the pending tail first; otherwise
    /// inserts according to the priority/affinity rules. Never fails.
    pub fn enqueue(&self, command: Arc<dyn Command>) -> EnqueueResult {
        let mut inner = self.inner.lock();

        if Self::apply_successive_dedupe(&mut inner, &command) {
            debug!(id = command.id(), name = command.name(), "enqueue deduplicated");
            return EnqueueResult {
                command_id: command.id().to_string(),
                position: -1,
                deduplicated: true,
            };
        }

        let command_id = command.id().to_string();
        let index = Self::insert_with_priority_and_affinity(&mut inner, command);
        inner.stats.enqueued += 1;
        debug!(id = %command_id, position = index, "enqueued");
        #[allow(clippy::cast_possible_wrap)]
        let position = index as isize;
        EnqueueResult {
            command_id,
            position,
            deduplicated: false,
        }
    }

    /// Compare the incoming fingerprint to the pending tail only. On a match
    /// the higher-priority command survives; returns whether dedupe applied.
    fn apply_successive_dedupe(inner: &mut QueueInner, incoming: &Arc<dyn Command>) -> bool {
        let Some(last) = inner.pending.last() else {
            return false;
        };
        if last.fingerprint() != incoming.fingerprint() {
            return false;
        }

        let replace = incoming.priority() > last.priority();
        inner.stats.deduplicated += 1;
        if replace {
            let tail = inner.pending.len() - 1;
            inner.pending[tail] = Arc::clone(incoming);
            inner.stats.replaced += 1;
        }
        true
    }

    /// Find the insertion index per the priority/affinity rules and insert.
    fn insert_with_priority_and_affinity(
        inner: &mut QueueInner,
        incoming: Arc<dyn Command>,
    ) -> usize {
        if incoming.priority() == CommandPriority::Highest {
            inner.pending.insert(0, incoming);
            return 0;
        }

        let incoming_affinity = incoming.affinity_key().map(str::to_owned);
        let mut insert_index = inner.pending.len();
        for (i, existing) in inner.pending.iter().enumerate() {
            if incoming.priority() > existing.priority() {
                let different_affinity = match (incoming_affinity.as_deref(), existing.affinity_key()) {
                    (Some(a), Some(b)) => a != b,
                    _ => true,
                };
                let existing_not_running =
                    !inner.running.iter().any(|r| r.id() == existing.id());
                if different_affinity || existing_not_running {
                    insert_index = i;
                    break;
                }
            }
            // Equal priority: stable ordering, keep scanning past the block.
            // Lower priority: keep scanning to insert later.
        }

        inner.pending.insert(insert_index, incoming);
        insert_index
    }

    /// Owned copy of the pending list, head first.
    #[must_use]
    pub fn pending_snapshot(&self) -> Vec<Arc<dyn Command>> {
        self.inner.lock().pending.clone()
    }

    /// Owned copy of the running list.
    #[must_use]
    pub fn running_snapshot(&self) -> Vec<Arc<dyn Command>> {
        self.inner.lock().running.clone()
    }

    /// Owned copy of the completed list, in completion order.
    #[must_use]
    pub fn completed_snapshot(&self) -> Vec<Arc<dyn Command>> {
        self.inner.lock().completed.clone()
    }

    /// Number of pending commands.
    #[must_use]
    pub fn size_pending(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Number of running commands.
    #[must_use]
    pub fn size_running(&self) -> usize {
        self.inner.lock().running.len()
    }

    /// Number of completed commands.
    #[must_use]
    pub fn size_completed(&self) -> usize {
        self.inner.lock().completed.len()
    }

    /// Snapshot of the traffic counters.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        self.inner.lock().stats
    }

    /// Atomically move a command from pending to running.
    ///
    /// Returns `false` as a silent no-op when the id is not pending, so
    /// racing claimers stay idempotent.
    pub fn start_running(&self, command_id: &str) -> bool {
        let mut inner = self.inner.lock();
        let Some(index) = inner.pending.iter().position(|c| c.id() == command_id) else {
            return false;
        };
        let command = inner.pending.remove(index);
        inner.running.push(command);
        inner.stats.started += 1;
        true
    }

    /// Atomically move a command from running to completed.
    ///
    /// Returns `false` as a silent no-op when the id is not running. Pure
    /// bookkeeping; the command's status is not touched here.
    pub fn finish_running(&self, command_id: &str) -> bool {
        let mut inner = self.inner.lock();
        let Some(index) = inner.running.iter().position(|c| c.id() == command_id) else {
            return false;
        };
        let command = inner.running.remove(index);
        inner.completed.push(command);
        inner.stats.completed += 1;
        true
    }
}
