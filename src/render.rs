//! Human-friendly rendering of queue state for debugging and test output.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::core::{Command, CommandQueue};

/// Render the queue's three sections to a text block.
///
/// Stable enough for snapshot-style assertions, but not a wire format.
#[must_use]
pub fn render(queue: &CommandQueue) -> String {
    let mut out = String::from("Command Queue\n");
    render_section(&mut out, "Pending", &queue.pending_snapshot(), false);
    render_section(&mut out, "Running", &queue.running_snapshot(), false);
    render_section(&mut out, "Completed", &queue.completed_snapshot(), true);
    out
}

fn render_section(
    out: &mut String,
    title: &str,
    commands: &[Arc<dyn Command>],
    include_status: bool,
) {
    let _ = writeln!(out, "{title} ({})", commands.len());
    for (index, command) in commands.iter().enumerate() {
        let _ = write!(
            out,
            "  [{index}] {} {}#{}",
            command.priority(),
            command.name(),
            command.id()
        );
        if let Some(key) = command.affinity_key() {
            let _ = write!(out, " @{key}");
        }
        if include_status {
            let _ = write!(out, " status={}", command.status());
        }
        out.push('\n');
    }
}
