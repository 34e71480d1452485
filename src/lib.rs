//! # PromptQ
//!
//! An in-memory command scheduling engine for LLM prompt-testing harnesses.
//!
//! Tool invocations requested by an agent under test are mapped to abstract
//! [`Command`](core::Command) values, ordered by priority/affinity/dedupe
//! rules in a [`CommandQueue`](core::CommandQueue), and optionally executed
//! by a bounded [`QueueWorker`](core::QueueWorker) pool that serializes
//! commands sharing an affinity key.
//!
//! ## Ordering rules
//!
//! - `Highest` priority is an interrupt tier: it always lands at the head of
//!   the pending queue.
//! - Other priorities may only jump *pending* entries; insertion-time
//!   preemption reorders the queue but never interrupts in-flight work.
//! - A command fingerprint-identical to the pending tail is merged away,
//!   keeping the higher-priority of the two.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use promptq::config::WorkerConfig;
//! use promptq::core::{CommandQueue, QueueWorker};
//!
//! let queue = Arc::new(CommandQueue::new());
//! queue.enqueue(my_command); // implements promptq::core::Command
//!
//! let worker = QueueWorker::new(Arc::clone(&queue), WorkerConfig::new().with_worker_count(2));
//! worker.start();
//! // ...
//! worker.stop_gracefully();
//! worker.await_idle(std::time::Duration::from_secs(1));
//! ```
//!
//! Execution semantics (what a command *does*) are caller-supplied via the
//! `execute` hook; this crate only schedules.

#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

/// Core command model, ordering engine, and worker pool.
pub mod core;
/// Configuration models for the worker pool.
pub mod config;
/// Invocation-to-command dispatch plumbing.
pub mod dispatch;
/// Diagnostic rendering of queue state.
pub mod render;
/// Shared utilities.
pub mod util;
