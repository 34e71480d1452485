//! Command model: priorities, statuses, the [`Command`] trait, and
//! fingerprinting.
//!
//! Commands are immutable descriptions of work derived from tool invocations.
//! The queue never looks inside them beyond the capability set below; concrete
//! commands are plain data plus a fingerprint payload, not a type hierarchy.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Priority tiers for queue ordering. `Highest` is an interrupt tier that
/// always lands at the head of the pending queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandPriority {
    /// Background work.
    Low,
    /// Default tier.
    Medium,
    /// Preempts pending lower-priority work on insertion.
    High,
    /// Unconditional head placement, ahead of everything pending.
    Highest,
}

impl fmt::Display for CommandPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Highest => write!(f, "HIGHEST"),
        }
    }
}

impl FromStr for CommandPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "highest" => Ok(Self::Highest),
            _ => Err(format!("unknown priority: {s}")),
        }
    }
}

/// Lifecycle status of a command.
///
/// `Pending → Running → Completed | CompletedWithError | Cancelled`; the
/// three terminal states never transition further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    /// Waiting in the pending queue.
    Pending,
    /// Claimed by a worker and executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Execution returned an error or panicked.
    CompletedWithError,
    /// Cancelled by the command's own implementation.
    Cancelled,
}

impl CommandStatus {
    /// Whether no further transitions are possible from this status.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::CompletedWithError | Self::Cancelled)
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Running => 1,
            Self::Completed => 2,
            Self::CompletedWithError => 3,
            Self::Cancelled => 4,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Pending,
            1 => Self::Running,
            2 => Self::Completed,
            3 => Self::CompletedWithError,
            _ => Self::Cancelled,
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Running => write!(f, "RUNNING"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::CompletedWithError => write!(f, "COMPLETED_WITH_ERROR"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Capability set every schedulable command exposes.
///
/// Implementations embed a [`CommandMeta`] for the shared bookkeeping and add
/// their own payload fields; `fingerprint` is typically a call to
/// [`fingerprint_digest`] over that payload.
pub trait Command: Send + Sync {
    /// Stable identifier for this command instance.
    fn id(&self) -> &str;

    /// Human-friendly name for diagnostics (e.g. `CreateTicket`).
    fn name(&self) -> &str;

    /// Priority controlling ordering and insertion-time preemption.
    fn priority(&self) -> CommandPriority;

    /// Optional serialization domain; commands sharing a key never run
    /// concurrently.
    fn affinity_key(&self) -> Option<&str>;

    /// Deterministic digest of the command's semantic content, used for
    /// successive-duplicate suppression. Priority is excluded.
    fn fingerprint(&self) -> String;

    /// Execution hook invoked by the worker. Default is a no-op.
    ///
    /// # Errors
    ///
    /// An error marks the command `CompletedWithError`; it is never
    /// propagated past the worker.
    fn execute(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Current lifecycle status.
    fn status(&self) -> CommandStatus;

    /// Record a status transition. Default is a no-op for commands that do
    /// not track status; [`CommandMeta`]-backed commands honor it and refuse
    /// to leave terminal states.
    fn set_status(&self, status: CommandStatus) {
        let _ = status;
    }

    /// Request cooperative cancellation. Only the command's own `execute`
    /// implementation ever acts on the flag; the queue and worker do not.
    fn request_cancel(&self);
}

/// Shared bookkeeping embedded by concrete commands: identity, priority,
/// affinity, and the mutable status/cancel cells.
#[derive(Debug)]
pub struct CommandMeta {
    id: String,
    priority: CommandPriority,
    affinity_key: Option<String>,
    status: AtomicU8,
    cancel_requested: AtomicBool,
}

impl CommandMeta {
    /// Create with a generated UUID id.
    #[must_use]
    pub fn new(priority: CommandPriority, affinity_key: Option<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), priority, affinity_key)
    }

    /// Create with a caller-provided natural key.
    #[must_use]
    pub fn with_id(
        id: impl Into<String>,
        priority: CommandPriority,
        affinity_key: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            priority,
            affinity_key,
            status: AtomicU8::new(CommandStatus::Pending.as_u8()),
            cancel_requested: AtomicBool::new(false),
        }
    }

    /// Stable command id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Scheduling priority.
    #[must_use]
    pub fn priority(&self) -> CommandPriority {
        self.priority
    }

    /// Optional affinity key.
    #[must_use]
    pub fn affinity_key(&self) -> Option<&str> {
        self.affinity_key.as_deref()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> CommandStatus {
        CommandStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Transition to `status`. Terminal states are never overwritten.
    pub fn set_status(&self, status: CommandStatus) {
        let mut current = self.status.load(Ordering::Acquire);
        loop {
            if CommandStatus::from_u8(current).is_terminal() {
                return;
            }
            match self.status.compare_exchange_weak(
                current,
                status.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    /// Set the cooperative cancel flag.
    pub fn request_cancel(&self) {
        self.cancel_requested.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::Acquire)
    }
}

/// Digest `name|affinity|payload` into a fingerprint string.
///
/// Priority is intentionally excluded so two commands with identical semantic
/// content but different priorities count as duplicates for the successive
/// dedupe rule (the higher priority wins).
#[must_use]
pub fn fingerprint_digest(name: &str, affinity_key: Option<&str>, payload: &str) -> String {
    let content = format!("{name}|{}|{payload}", affinity_key.unwrap_or_default());
    URL_SAFE_NO_PAD.encode(Sha256::digest(content.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_ordering() {
        assert!(CommandPriority::Low < CommandPriority::Medium);
        assert!(CommandPriority::Medium < CommandPriority::High);
        assert!(CommandPriority::High < CommandPriority::Highest);
    }

    #[test]
    fn priority_display_and_parse() {
        assert_eq!(CommandPriority::High.to_string(), "HIGH");
        assert_eq!("highest".parse::<CommandPriority>().unwrap(), CommandPriority::Highest);
        assert_eq!("LOW".parse::<CommandPriority>().unwrap(), CommandPriority::Low);
        assert!("urgent".parse::<CommandPriority>().is_err());
    }

    #[test]
    fn priority_serde() {
        let json = serde_json::to_string(&CommandPriority::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
        let parsed: CommandPriority = serde_json::from_str("\"highest\"").unwrap();
        assert_eq!(parsed, CommandPriority::Highest);
    }

    #[test]
    fn status_transitions_stop_at_terminal() {
        let meta = CommandMeta::new(CommandPriority::Medium, None);
        assert_eq!(meta.status(), CommandStatus::Pending);
        meta.set_status(CommandStatus::Running);
        meta.set_status(CommandStatus::Completed);
        assert_eq!(meta.status(), CommandStatus::Completed);
        meta.set_status(CommandStatus::Running);
        assert_eq!(meta.status(), CommandStatus::Completed);
    }

    #[test]
    fn cancel_flag_is_sticky() {
        let meta = CommandMeta::new(CommandPriority::Low, Some("T-1".into()));
        assert!(!meta.cancel_requested());
        meta.request_cancel();
        assert!(meta.cancel_requested());
    }

    #[test]
    fn natural_keys_are_kept_and_generated_ids_are_unique() {
        let natural = CommandMeta::with_id("ticket-sync-1", CommandPriority::High, None);
        assert_eq!(natural.id(), "ticket-sync-1");

        let a = CommandMeta::new(CommandPriority::Low, None);
        let b = CommandMeta::new(CommandPriority::Low, None);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn fingerprint_is_deterministic_and_content_sensitive() {
        let a = fingerprint_digest("AddComment", Some("T-1"), "T-1|same");
        let b = fingerprint_digest("AddComment", Some("T-1"), "T-1|same");
        assert_eq!(a, b);
        assert_ne!(a, fingerprint_digest("AddComment", Some("T-2"), "T-1|same"));
        assert_ne!(a, fingerprint_digest("AddComment", Some("T-1"), "T-1|other"));
        assert_ne!(a, fingerprint_digest("UpdateStatus", Some("T-1"), "T-1|same"));
    }
}
