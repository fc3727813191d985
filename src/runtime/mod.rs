/// Runtime layer
///
/// The engine contract the synchronizer and service depend on, the petgraph
/// model of a workflow's execution graph and its display projection.

// Engine contract and run state
pub mod engine;

// Execution graph parsed from the document
pub mod graph;

// Flattening of the graph into display nodes
pub mod projector;

pub use engine::{RunState, WorkflowEngine};
pub use graph::ExecutionGraph;
