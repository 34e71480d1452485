//! Error types for the command engine.

use thiserror::Error;

/// Errors produced by the dispatch layer.
///
/// Queue and worker operations never error: unknown ids are silent no-ops
/// and execution failures are recorded on the command itself.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No registered factory accepts the invocation. This is a
    /// configuration error and fails fast.
    #[error("no command factory for provider={provider}, model={model}, tool={tool}")]
    NoFactory {
        /// Provider the dispatcher was built for.
        provider: String,
        /// Model the dispatcher was built for.
        model: String,
        /// Tool id of the unmatched invocation.
        tool: String,
    },
    /// A factory accepted the invocation but failed to build commands.
    #[error("command factory failed for tool {tool}")]
    Factory {
        /// Tool id of the failing invocation.
        tool: String,
        /// Factory-reported cause.
        #[source]
        source: anyhow::Error,
    },
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
