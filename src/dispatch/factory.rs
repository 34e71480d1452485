//! Command factories and their registry.

use std::sync::Arc;

use crate::core::{AppResult, Command};
use crate::dispatch::{CommandMappingPolicy, ToolInvocation};

/// Builds commands for the tool invocations it supports.
pub trait ToolCommandFactory: Send + Sync {
    /// Whether this factory handles the given coordinates.
    fn supports(&self, provider: &str, model: &str, tool: &str, tool_version: Option<&str>) -> bool;

    /// Build zero or more commands for an invocation, consulting `policy`
    /// for default priority and affinity.
    ///
    /// # Errors
    ///
    /// Any factory-specific failure; surfaced to the caller as
    /// [`DispatchError::Factory`](crate::core::DispatchError::Factory).
    fn create(
        &self,
        provider: &str,
        model: &str,
        invocation: &ToolInvocation,
        policy: &dyn CommandMappingPolicy,
    ) -> AppResult<Vec<Arc<dyn Command>>>;
}

/// Ordered factory registry; the first factory whose `supports` matches
/// wins. Registration is explicit and declarative, never discovered at
/// runtime.
#[derive(Default)]
pub struct FactoryRegistry {
    factories: Vec<Box<dyn ToolCommandFactory>>,
}

impl FactoryRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from an ordered factory list.
    #[must_use]
    pub fn with_factories(factories: Vec<Box<dyn ToolCommandFactory>>) -> Self {
        Self { factories }
    }

    /// Append a factory; earlier registrations take precedence.
    pub fn register(&mut self, factory: Box<dyn ToolCommandFactory>) {
        self.factories.push(factory);
    }

    /// Find the first factory supporting the given coordinates.
    #[must_use]
    pub fn find_factory(
        &self,
        provider: &str,
        model: &str,
        tool: &str,
        tool_version: Option<&str>,
    ) -> Option<&dyn ToolCommandFactory> {
        self.factories
            .iter()
            .map(Box::as_ref)
            .find(|f| f.supports(provider, model, tool, tool_version))
    }
}
