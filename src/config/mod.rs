/// Configuration management for the flowdoc service
///
/// Handles server binding and the folders/files the workflow engine reads.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Workflow engine locations
    pub engine: EngineConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Folders and reference files used by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Folder holding one XML document per workflow (default: "workflows")
    pub workflows_folder: PathBuf,
    /// Folder deleted workflow files are moved to (default: "trash")
    pub trash_folder: PathBuf,
    /// JSON array of available task names
    pub tasks_names_file: PathBuf,
    /// JSON object mapping task names to their setting names
    pub tasks_settings_file: PathBuf,
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("FLOWDOC_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("FLOWDOC_PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .unwrap_or(8000),
            },
            engine: EngineConfig {
                workflows_folder: env_path("FLOWDOC_WORKFLOWS_DIR", "workflows"),
                trash_folder: env_path("FLOWDOC_TRASH_DIR", "trash"),
                tasks_names_file: env_path("FLOWDOC_TASKS_NAMES", "TasksNames.json"),
                tasks_settings_file: env_path("FLOWDOC_TASKS_SETTINGS", "TasksSettings.json"),
            },
        }
    }
}

fn env_path(var: &str, default: &str) -> PathBuf {
    std::env::var_os(var)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}
