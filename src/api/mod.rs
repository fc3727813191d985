/// HTTP API Layer
///
/// REST endpoints for listing, inspecting, saving and deleting workflow
/// documents, plus the validation helpers used by the editor.

// Workflow endpoints
pub mod workflows;

// Re-export router builder and state
pub use workflows::{create_workflow_routes, AppState};
