//! Mapping policies supplying default scheduling attributes.

use std::collections::HashMap;

use crate::core::CommandPriority;
use crate::dispatch::ToolInvocation;

/// Supplies default priority and affinity for mapped commands.
pub trait CommandMappingPolicy: Send + Sync {
    /// Priority for commands built from `invocation`.
    fn resolve_priority(&self, invocation: &ToolInvocation) -> CommandPriority;

    /// Affinity key for commands built from `invocation`, if any.
    fn resolve_affinity(&self, invocation: &ToolInvocation) -> Option<String>;
}

/// Map-backed policy: per-tool priorities with a `Medium` fallback and no
/// affinity.
#[derive(Debug, Default)]
pub struct StaticMappingPolicy {
    priority_by_tool: HashMap<String, CommandPriority>,
}

impl StaticMappingPolicy {
    /// Create from a tool-id to priority map.
    #[must_use]
    pub fn new(priority_by_tool: HashMap<String, CommandPriority>) -> Self {
        Self { priority_by_tool }
    }
}

impl CommandMappingPolicy for StaticMappingPolicy {
    fn resolve_priority(&self, invocation: &ToolInvocation) -> CommandPriority {
        self.priority_by_tool
            .get(&invocation.tool)
            .copied()
            .unwrap_or(CommandPriority::Medium)
    }

    fn resolve_affinity(&self, _invocation: &ToolInvocation) -> Option<String> {
        None
    }
}
