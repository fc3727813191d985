/// Task and setting codecs
///
/// Shared by the creation and update paths of the synchronizer and by the
/// task listing read path, so a task is encoded the same way everywhere.

// Single setting <-> Setting element
pub mod setting;

// Task with its settings <-> Task element
pub mod task;

/// Structural problems found while decoding elements
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("missing attribute '{0}'")]
    MissingAttribute(&'static str),

    #[error("invalid value '{1}' for attribute '{0}'")]
    InvalidAttribute(&'static str, String),
}
