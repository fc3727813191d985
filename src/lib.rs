/// flowdoc: workflow document synchronizer
///
/// Maps the JSON form of a workflow edited by a client onto the XML documents
/// a workflow engine loads, keeps an in-memory hot-reload registry of those
/// documents and projects their execution graphs for display.

// Core configuration and setup
pub mod config;

// XML document model, reader, writer and schema vocabulary
pub mod document;

// Setting and task element codecs
pub mod codec;

// Task names and settings reference data
pub mod catalog;

// Workflow definitions, registry, synchronizer and service operations
pub mod workflow;

// Engine contract, execution graph and its projection
pub mod runtime;

// HTTP API layer
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use document::{Document, Element};
pub use runtime::{ExecutionGraph, WorkflowEngine};
pub use server::start_server;
pub use workflow::{SaveOutcome, Workflow, WorkflowRegistry, WorkflowService, WorkflowSynchronizer};
