/// Execution graph projection for display
///
/// Flattens a workflow's top-level execution graph into labeled nodes with
/// synthesized `n<id>` identifiers, in the graph's own node order.

use crate::runtime::engine::WorkflowEngine;
use crate::runtime::graph::{GraphNode, NodeKind};
use crate::workflow::definition::Workflow;
use crate::workflow::types::GraphNodeInfo;

/// Project the graph of workflow `id`, or `None` when it is not loaded
pub fn execution_graph(engine: &dyn WorkflowEngine, id: i32) -> Option<Vec<GraphNodeInfo>> {
    engine.get_workflow(id).map(|workflow| project(&workflow))
}

pub fn project(workflow: &Workflow) -> Vec<GraphNodeInfo> {
    workflow
        .graph
        .nodes()
        .map(|node| GraphNodeInfo {
            id: display_id(node.id),
            name: label(node, workflow),
            parent_id: display_id(node.parent_id),
        })
        .collect()
}

fn display_id(id: i32) -> String {
    format!("n{}", id)
}

fn label(node: &GraphNode, workflow: &Workflow) -> String {
    match &node.kind {
        NodeKind::Task => match workflow.task(node.id) {
            Some(task) => format!("Task {}: {}", node.id, task.description),
            None => format!("Task {}", node.id),
        },
        NodeKind::If { .. } => "If...EndIf".to_string(),
        NodeKind::While { .. } => "While...EndWhile".to_string(),
        NodeKind::Switch { .. } => "Switch...EndSwitch".to_string(),
    }
}
