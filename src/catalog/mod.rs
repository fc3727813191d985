/// Task catalog lookups
///
/// Read-only reference data describing which task types exist and which
/// settings each of them accepts. Files are re-read on every call so edits
/// show up without a restart.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const INVALID_TASK_NAMES: &str = "TasksNames.json is not valid.";
pub const INVALID_TASK_SETTINGS: &str = "TasksSettings.json is not valid.";

#[derive(Debug, Clone)]
pub struct TaskCatalog {
    names_file: PathBuf,
    settings_file: PathBuf,
}

impl TaskCatalog {
    pub fn new(names_file: impl Into<PathBuf>, settings_file: impl Into<PathBuf>) -> Self {
        Self {
            names_file: names_file.into(),
            settings_file: settings_file.into(),
        }
    }

    /// Sorted task names, or a single error message when the file is unusable
    pub fn task_names(&self) -> Vec<String> {
        read_task_names(&self.names_file).unwrap_or_else(|e| {
            tracing::error!("Failed to read task names: {:#}", e);
            vec![INVALID_TASK_NAMES.to_string()]
        })
    }

    /// Sorted setting names of `task_name`; empty for unknown tasks
    pub fn task_settings(&self, task_name: &str) -> Vec<String> {
        read_task_settings(&self.settings_file, task_name).unwrap_or_else(|e| {
            tracing::error!("Failed to read task settings: {:#}", e);
            vec![INVALID_TASK_SETTINGS.to_string()]
        })
    }
}

fn read_task_names(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut names: Vec<String> = serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    names.sort();
    Ok(names)
}

fn read_task_settings(path: &Path, task_name: &str) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let catalog: HashMap<String, Value> =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;

    let Some(entry) = catalog.get(task_name) else {
        return Ok(Vec::new());
    };
    let mut settings: Vec<String> = serde_json::from_value(entry.clone())
        .with_context(|| format!("settings of task {} are not a list of names", task_name))?;
    settings.sort();
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_sorted_names_and_settings() {
        let dir = tempfile::tempdir().unwrap();
        let names = dir.path().join("names.json");
        let settings = dir.path().join("settings.json");
        std::fs::write(&names, r#"["Wait", "FilesCopier", "Http"]"#).unwrap();
        std::fs::write(&settings, r#"{"FilesCopier": ["overwrite", "destFolder"]}"#).unwrap();

        let catalog = TaskCatalog::new(&names, &settings);
        assert_eq!(catalog.task_names(), ["FilesCopier", "Http", "Wait"]);
        assert_eq!(catalog.task_settings("FilesCopier"), ["destFolder", "overwrite"]);
        assert!(catalog.task_settings("Unknown").is_empty());
    }

    #[test]
    fn invalid_files_yield_message() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();

        let catalog = TaskCatalog::new(&broken, &broken);
        assert_eq!(catalog.task_names(), [INVALID_TASK_NAMES]);
        assert_eq!(catalog.task_settings("Any"), [INVALID_TASK_SETTINGS]);
    }
}
