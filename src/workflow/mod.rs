/// Workflow Management Layer
///
/// Workflow definitions loaded from XML documents, the hot-reload registry
/// holding them, the synchronizer that writes client edits back to disk and
/// the service operations exposed over HTTP.

// Wire types exchanged with the editor
pub mod types;

// Duration grammar of the `period` setting
pub mod period;

// Loaded workflow definition
pub mod definition;

// Hot-reload registry using ArcSwap
pub mod registry;

// JSON-to-document save protocol
pub mod synchronizer;

// Operations behind the HTTP endpoints
pub mod service;

// Re-export commonly used types
pub use definition::Workflow;
pub use period::Period;
pub use registry::WorkflowRegistry;
pub use service::WorkflowService;
pub use synchronizer::{SaveError, SaveOutcome, WorkflowSynchronizer};
pub use types::{LaunchType, SaveRequest, TaskInfo, WorkflowInfo};
