//! Maps external tool invocations to commands and enqueues them.
//!
//! This layer has no ordering or concurrency logic of its own; it completes
//! the command-creation path feeding the queue. Factories are registered
//! explicitly and matched in order; a missing factory is a hard
//! configuration error.

mod factory;
mod policy;

pub use factory::{FactoryRegistry, ToolCommandFactory};
pub use policy::{CommandMappingPolicy, StaticMappingPolicy};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::core::{Command, CommandQueue, DispatchError, EnqueueResult};

/// A tool invocation requested by an LLM agent: tool id, optional version,
/// and opaque JSON arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Tool identifier.
    pub tool: String,
    /// Optional tool version.
    pub tool_version: Option<String>,
    /// Opaque JSON arguments as produced by the agent.
    pub args: Value,
}

impl ToolInvocation {
    /// Create an unversioned invocation.
    #[must_use]
    pub fn new(tool: impl Into<String>, args: Value) -> Self {
        Self {
            tool: tool.into(),
            tool_version: None,
            args,
        }
    }

    /// Attach a tool version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.tool_version = Some(version.into());
        self
    }
}

/// One enqueued command together with its source invocation and placement.
pub struct EnqueuedCommand {
    /// The invocation the command was built from.
    pub invocation: ToolInvocation,
    /// The command handed to the queue.
    pub command: Arc<dyn Command>,
    /// Placement reported by the queue.
    pub result: EnqueueResult,
}

impl std::fmt::Debug for EnqueuedCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnqueuedCommand")
            .field("invocation", &self.invocation)
            .field("command", &self.command.name())
            .field("result", &self.result)
            .finish()
    }
}

/// Aggregated outcome of a dispatch call, in enqueue order.
#[derive(Default, Debug)]
pub struct DispatchOutcome {
    enqueued: Vec<EnqueuedCommand>,
}

impl DispatchOutcome {
    /// The enqueued (invocation, command, result) triples.
    #[must_use]
    pub fn enqueued(&self) -> &[EnqueuedCommand] {
        &self.enqueued
    }

    fn push(&mut self, entry: EnqueuedCommand) {
        self.enqueued.push(entry);
    }
}

/// Routes invocations through a factory registry into a queue.
pub struct Dispatcher {
    registry: FactoryRegistry,
    provider: String,
    model: String,
}

impl Dispatcher {
    /// Create a dispatcher bound to a provider/model pair.
    #[must_use]
    pub fn new(registry: FactoryRegistry, provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            registry,
            provider: provider.into(),
            model: model.into(),
        }
    }

    /// Map each invocation to commands via the first matching factory and
    /// enqueue them immediately.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NoFactory`] when no registered factory supports an
    /// invocation; [`DispatchError::Factory`] when a factory fails.
    pub fn dispatch(
        &self,
        invocations: &[ToolInvocation],
        queue: &CommandQueue,
        policy: &dyn CommandMappingPolicy,
    ) -> Result<DispatchOutcome, DispatchError> {
        let mut outcome = DispatchOutcome::default();

        for invocation in invocations {
            let factory = self
                .registry
                .find_factory(
                    &self.provider,
                    &self.model,
                    &invocation.tool,
                    invocation.tool_version.as_deref(),
                )
                .ok_or_else(|| DispatchError::NoFactory {
                    provider: self.provider.clone(),
                    model: self.model.clone(),
                    tool: invocation.tool.clone(),
                })?;

            let commands = factory
                .create(&self.provider, &self.model, invocation, policy)
                .map_err(|source| DispatchError::Factory {
                    tool: invocation.tool.clone(),
                    source,
                })?;

            for command in commands {
                let result = queue.enqueue(Arc::clone(&command));
                debug!(
                    tool = %invocation.tool,
                    id = %result.command_id,
                    position = result.position,
                    deduplicated = result.deduplicated,
                    "dispatched command"
                );
                outcome.push(EnqueuedCommand {
                    invocation: invocation.clone(),
                    command,
                    result,
                });
            }
        }

        Ok(outcome)
    }
}
