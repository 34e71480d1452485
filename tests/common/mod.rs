//! Mock ticket-application commands and helpers shared by the integration
//! suites.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use promptq::core::{fingerprint_digest, Command, CommandMeta, CommandPriority, CommandStatus};

/// Scripted execution behavior.
pub enum Behavior {
    /// Return `Ok(())`.
    Succeed,
    /// Return an error.
    Fail,
    /// Panic out of the execution hook.
    Panic,
    /// Hold the worker for a fixed duration, then succeed.
    Sleep(Duration),
    /// Track execution concurrency against a shared gauge, holding briefly
    /// so overlaps are observable.
    Guarded {
        /// Commands currently inside `execute` for this gauge.
        gauge: Arc<AtomicU64>,
        /// Highest concurrency ever observed on the gauge.
        max_seen: Arc<AtomicU64>,
        /// How long to hold the gauge.
        hold: Duration,
    },
}

/// Configurable mock command: data plus a fingerprint payload, with
/// scripted behavior for worker tests.
pub struct MockCommand {
    meta: CommandMeta,
    name: &'static str,
    payload: String,
    behavior: Behavior,
    executions: AtomicU64,
}

impl MockCommand {
    /// Command without an affinity key.
    pub fn new(name: &'static str, payload: impl Into<String>, priority: CommandPriority) -> Self {
        Self::with_affinity_opt(name, payload, priority, None)
    }

    /// Command bound to an affinity key.
    pub fn with_affinity(
        name: &'static str,
        payload: impl Into<String>,
        priority: CommandPriority,
        affinity: &str,
    ) -> Self {
        Self::with_affinity_opt(name, payload, priority, Some(affinity.to_owned()))
    }

    /// Fully explicit constructor.
    pub fn with_affinity_opt(
        name: &'static str,
        payload: impl Into<String>,
        priority: CommandPriority,
        affinity: Option<String>,
    ) -> Self {
        Self {
            meta: CommandMeta::new(priority, affinity),
            name,
            payload: payload.into(),
            behavior: Behavior::Succeed,
            executions: AtomicU64::new(0),
        }
    }

    /// Replace the scripted behavior.
    pub fn behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// How many times `execute` ran.
    pub fn executions(&self) -> u64 {
        self.executions.load(Ordering::SeqCst)
    }

    /// Whether cancellation was requested.
    pub fn cancel_requested(&self) -> bool {
        self.meta.cancel_requested()
    }
}

impl Command for MockCommand {
    fn id(&self) -> &str {
        self.meta.id()
    }

    fn name(&self) -> &str {
        self.name
    }

    fn priority(&self) -> CommandPriority {
        self.meta.priority()
    }

    fn affinity_key(&self) -> Option<&str> {
        self.meta.affinity_key()
    }

    fn fingerprint(&self) -> String {
        fingerprint_digest(self.name, self.affinity_key(), &self.payload)
    }

    fn execute(&self) -> anyhow::Result<()> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => Err(anyhow::anyhow!("scripted failure")),
            Behavior::Panic => panic!("scripted panic"),
            Behavior::Sleep(duration) => {
                thread::sleep(*duration);
                Ok(())
            }
            Behavior::Guarded { gauge, max_seen, hold } => {
                let current = gauge.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(current, Ordering::SeqCst);
                thread::sleep(*hold);
                gauge.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    fn status(&self) -> CommandStatus {
        self.meta.status()
    }

    fn set_status(&self, status: CommandStatus) {
        self.meta.set_status(status);
    }

    fn request_cancel(&self) {
        self.meta.request_cancel();
    }
}

/// `CreateTicket` in a project; affinity is the project key.
pub fn create_ticket(
    project: &str,
    summary: &str,
    description: &str,
    priority: CommandPriority,
) -> Arc<MockCommand> {
    Arc::new(MockCommand::with_affinity(
        "CreateTicket",
        format!("{project}|{summary}|{description}"),
        priority,
        project,
    ))
}

/// `AddComment` on a ticket; affinity is the ticket id.
pub fn add_comment(ticket: &str, comment: &str, priority: CommandPriority) -> Arc<MockCommand> {
    Arc::new(MockCommand::with_affinity(
        "AddComment",
        format!("{ticket}|{comment}"),
        priority,
        ticket,
    ))
}

/// `UpdateStatus` on a ticket; affinity is the ticket id.
pub fn update_status(ticket: &str, status: &str, priority: CommandPriority) -> Arc<MockCommand> {
    Arc::new(MockCommand::with_affinity(
        "UpdateStatus",
        format!("{ticket}|{status}"),
        priority,
        ticket,
    ))
}

/// `Cancel` is the interrupt tier: always `Highest`.
pub fn cancel_ticket(ticket: &str, reason: &str) -> Arc<MockCommand> {
    Arc::new(MockCommand::with_affinity(
        "Cancel",
        format!("{ticket}|{reason}"),
        CommandPriority::Highest,
        ticket,
    ))
}

/// `Pause` is also `Highest`.
pub fn pause_ticket(ticket: &str, reason: &str) -> Arc<MockCommand> {
    Arc::new(MockCommand::with_affinity(
        "Pause",
        format!("{ticket}|{reason}"),
        CommandPriority::Highest,
        ticket,
    ))
}

/// Poll `condition` every few milliseconds until it holds or `timeout`
/// elapses; returns the final evaluation.
pub fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
