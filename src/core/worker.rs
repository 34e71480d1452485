//! Bounded worker pool draining a [`CommandQueue`].
//!
//! Workers are dedicated OS threads cooperatively polling the pending list.
//! The pool enforces one rule beyond queue order: no two commands sharing a
//! non-empty affinity key execute concurrently. Reservation of an affinity
//! happens before the claim, and is released only after the claim fails or
//! the command finishes, so reservations cannot leak.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::bounded;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::WorkerConfig;
use crate::core::command::{Command, CommandStatus};
use crate::core::queue::CommandQueue;

/// Shared state handed to each worker thread.
struct WorkerContext {
    queue: Arc<CommandQueue>,
    running: Arc<AtomicBool>,
    active_affinities: Arc<Mutex<HashSet<String>>>,
    idle_poll: Duration,
    inter_start_latency: Duration,
}

/// Executes commands from a [`CommandQueue`] on a fixed pool of threads.
///
/// - Concurrency: `worker_count` threads (default 1).
/// - Affinity: never runs two commands with the same key concurrently.
/// - Errors: execution failures and panics become `CompletedWithError`.
/// - Cancellation: cooperative only; in-flight commands are never
///   interrupted.
pub struct QueueWorker {
    queue: Arc<CommandQueue>,
    config: WorkerConfig,
    running: Arc<AtomicBool>,
    active_affinities: Arc<Mutex<HashSet<String>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl QueueWorker {
    /// Create a worker pool over `queue`. A `worker_count` of zero is
    /// clamped to one.
    #[must_use]
    pub fn new(queue: Arc<CommandQueue>, config: WorkerConfig) -> Self {
        Self {
            queue,
            config,
            running: Arc::new(AtomicBool::new(false)),
            active_affinities: Arc::new(Mutex::new(HashSet::new())),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Create with the default configuration (single worker, 10ms idle
    /// poll, no pacing).
    #[must_use]
    pub fn with_defaults(queue: Arc<CommandQueue>) -> Self {
        Self::new(queue, WorkerConfig::default())
    }

    /// Spawn the worker threads. Idempotent; a second call while running is
    /// a no-op.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }

        let worker_count = self.config.worker_count.max(1);
        let mut handles = self.handles.lock();
        for worker_id in 0..worker_count {
            let ctx = WorkerContext {
                queue: Arc::clone(&self.queue),
                running: Arc::clone(&self.running),
                active_affinities: Arc::clone(&self.active_affinities),
                idle_poll: self.config.idle_poll(),
                inter_start_latency: self.config.inter_start_latency(),
            };
            let handle = thread::Builder::new()
                .name(format!("cq-worker-{worker_id}"))
                .spawn(move || worker_loop(worker_id, &ctx))
                .expect("failed to spawn worker thread");
            handles.push(handle);
        }

        info!(worker_count, "queue worker started");
    }

    /// Flip the cooperative running flag so workers stop admitting new
    /// polls. In-flight command execution is not interrupted.
    pub fn stop_gracefully(&self) {
        self.running.store(false, Ordering::Release);
        info!("queue worker stop requested");
    }

    /// Block until all worker threads exit or `timeout` elapses; returns
    /// whether termination was confirmed. Returns `true` when the pool was
    /// never started.
    pub fn await_idle(&self, timeout: Duration) -> bool {
        let mut handles = self.handles.lock();
        let deadline = Instant::now() + timeout;
        let mut all_exited = true;

        for (worker_id, handle) in handles.drain(..).enumerate() {
            let (tx, rx) = bounded::<bool>(1);
            let joiner = thread::spawn(move || {
                let _ = tx.send(handle.join().is_ok());
            });

            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(true) => {
                    debug!(worker_id, "worker joined");
                    let _ = joiner.join();
                }
                Ok(false) => {
                    warn!(worker_id, "worker thread panicked");
                    let _ = joiner.join();
                }
                Err(_) => {
                    // Worker still busy; detach the join helper rather than
                    // blocking past the caller's deadline.
                    warn!(worker_id, "worker did not exit within timeout");
                    all_exited = false;
                }
            }
        }

        all_exited
    }
}

impl Drop for QueueWorker {
    fn drop(&mut self) {
        // Signal shutdown but do not join; threads without a live flag exit
        // on their next poll.
        self.running.store(false, Ordering::Release);
    }
}

fn worker_loop(worker_id: usize, ctx: &WorkerContext) {
    debug!(worker_id, "worker thread started");
    while ctx.running.load(Ordering::Acquire) {
        // One full poll/execute iteration. Anything escaping it that is not
        // attributable to a single command is swallowed: there is no restart
        // path, so a dead worker would silently halt progress.
        let iteration = panic::catch_unwind(AssertUnwindSafe(|| {
            let Some(command) = poll_next_eligible(ctx) else {
                thread::sleep(ctx.idle_poll);
                return;
            };

            if !ctx.inter_start_latency.is_zero() {
                thread::sleep(ctx.inter_start_latency);
            }

            run_command(worker_id, ctx, &command);
        }));
        if iteration.is_err() {
            warn!(worker_id, "worker iteration panicked; continuing");
        }
    }
    debug!(worker_id, "worker thread exiting");
}

/// Scan the current pending snapshot head-to-tail for the first command this
/// worker may claim.
///
/// Affinity-bearing commands reserve their key before the claim; if the
/// claim then fails (a racing worker won), the reservation is released and
/// the scan continues. The queue's `start_running` is the single source of
/// truth for "claimed".
fn poll_next_eligible(ctx: &WorkerContext) -> Option<Arc<dyn Command>> {
    for command in ctx.queue.pending_snapshot() {
        let affinity = command.affinity_key().map(str::to_owned);
        match affinity {
            Some(key) => {
                {
                    let mut active = ctx.active_affinities.lock();
                    if active.contains(&key) {
                        continue;
                    }
                    active.insert(key.clone());
                }
                if ctx.queue.start_running(command.id()) {
                    return Some(command);
                }
                ctx.active_affinities.lock().remove(&key);
            }
            None => {
                if ctx.queue.start_running(command.id()) {
                    return Some(command);
                }
            }
        }
    }
    None
}

/// Run one claimed command with guaranteed cleanup: `finish_running` and the
/// affinity release happen on every path, including panics out of `execute`.
fn run_command(worker_id: usize, ctx: &WorkerContext, command: &Arc<dyn Command>) {
    command.set_status(CommandStatus::Running);
    debug!(worker_id, id = command.id(), name = command.name(), "executing command");

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| command.execute()));
    match outcome {
        Ok(Ok(())) => command.set_status(CommandStatus::Completed),
        Ok(Err(error)) => {
            warn!(worker_id, id = command.id(), %error, "command failed");
            command.set_status(CommandStatus::CompletedWithError);
        }
        Err(_) => {
            warn!(worker_id, id = command.id(), "command panicked");
            command.set_status(CommandStatus::CompletedWithError);
        }
    }

    ctx.queue.finish_running(command.id());
    if let Some(key) = command.affinity_key() {
        ctx.active_affinities.lock().remove(key);
    }
}
