//! Worker pool configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a [`QueueWorker`](crate::core::QueueWorker) pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of worker threads draining the queue.
    pub worker_count: usize,
    /// Idle sleep between pending-list scans, in milliseconds.
    pub idle_poll_ms: u64,
    /// Fixed pacing delay before each command start, in milliseconds.
    /// Zero disables pacing.
    pub inter_start_latency_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_count: 1,
            idle_poll_ms: 10,
            inter_start_latency_ms: 0,
        }
    }
}

impl WorkerConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker thread count.
    #[must_use]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the idle poll interval in milliseconds.
    #[must_use]
    pub fn with_idle_poll_ms(mut self, idle_poll_ms: u64) -> Self {
        self.idle_poll_ms = idle_poll_ms;
        self
    }

    /// Set the inter-start pacing delay in milliseconds.
    #[must_use]
    pub fn with_inter_start_latency_ms(mut self, inter_start_latency_ms: u64) -> Self {
        self.inter_start_latency_ms = inter_start_latency_ms;
        self
    }

    /// Idle poll interval as a [`Duration`].
    #[must_use]
    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    /// Inter-start pacing delay as a [`Duration`].
    #[must_use]
    pub fn inter_start_latency(&self) -> Duration {
        Duration::from_millis(self.inter_start_latency_ms)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse a configuration from a JSON string and validate it.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation error description.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
