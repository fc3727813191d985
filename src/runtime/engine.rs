/// Engine interface consumed by the document layer
///
/// The synchronizer, the graph projector and the HTTP layer only talk to the
/// workflow engine through this trait. `WorkflowRegistry` is the in-process
/// implementation; tests can substitute their own.

use crate::workflow::definition::Workflow;
use anyhow::Result;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Running/paused flags reported for a workflow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunState {
    pub is_running: bool,
    pub is_paused: bool,
}

pub trait WorkflowEngine: Send + Sync {
    /// Resolve a workflow by id
    fn get_workflow(&self, id: i32) -> Option<Arc<Workflow>>;

    /// All loaded workflows, ordered by id
    fn workflows(&self) -> Vec<Arc<Workflow>>;

    fn run_state(&self, id: i32) -> RunState;

    fn start_workflow(&self, id: i32);
    fn stop_workflow(&self, id: i32);
    fn pause_workflow(&self, id: i32);
    fn resume_workflow(&self, id: i32);

    /// Replace the workflow previously known as `previous_id` with `workflow`,
    /// whose document has already been written to its file
    ///
    /// Fails when the new id belongs to a workflow stored in another file.
    fn reload(&self, previous_id: i32, workflow: Workflow) -> Result<Arc<Workflow>>;

    /// Load a newly created workflow file
    fn register(&self, path: &Path) -> Result<Arc<Workflow>>;

    /// Forget a workflow (its file has been moved away)
    fn remove(&self, id: i32);

    /// Cron syntax check used before accepting a cron-launched workflow
    fn is_cron_expression_valid(&self, expression: &str) -> bool {
        is_cron_expression_valid(expression)
    }
}

/// Seconds-first cron syntax with six or seven fields
pub fn is_cron_expression_valid(expression: &str) -> bool {
    !expression.trim().is_empty() && cron::Schedule::from_str(expression).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cron_validation() {
        assert!(is_cron_expression_valid("0 0 12 * * *"));
        assert!(is_cron_expression_valid("0 */5 * * * * *"));
        assert!(!is_cron_expression_valid("* * *"));
        assert!(!is_cron_expression_valid(""));
        assert!(!is_cron_expression_valid("not a cron"));
    }
}
