//! Core command model, ordering engine, and worker pool.

pub mod command;
pub mod error;
pub mod queue;
pub mod worker;

pub use command::{fingerprint_digest, Command, CommandMeta, CommandPriority, CommandStatus};
pub use error::{AppResult, DispatchError};
pub use queue::{CommandQueue, EnqueueResult, QueueStats};
pub use worker::QueueWorker;
