/// Workflow service operations
///
/// The operations behind the HTTP endpoints. Every operation reports failure
/// through its return value (`false`, `None` or an empty string) and logs the
/// cause; nothing here propagates an error to the caller.

use crate::catalog::TaskCatalog;
use crate::codec::task as task_codec;
use crate::document::writer;
use crate::runtime::engine::WorkflowEngine;
use crate::runtime::projector;
use crate::workflow::definition::Workflow;
use crate::workflow::period::Period;
use crate::workflow::synchronizer::WorkflowSynchronizer;
use crate::workflow::types::{GraphNodeInfo, TaskInfo, WorkflowSummary};
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct WorkflowService {
    engine: Arc<dyn WorkflowEngine>,
    synchronizer: WorkflowSynchronizer,
    catalog: TaskCatalog,
    workflows_folder: PathBuf,
    trash_folder: PathBuf,
}

impl WorkflowService {
    pub fn new(
        engine: Arc<dyn WorkflowEngine>,
        catalog: TaskCatalog,
        workflows_folder: impl Into<PathBuf>,
        trash_folder: impl Into<PathBuf>,
    ) -> Self {
        Self {
            synchronizer: WorkflowSynchronizer::new(Arc::clone(&engine)),
            engine,
            catalog,
            workflows_folder: workflows_folder.into(),
            trash_folder: trash_folder.into(),
        }
    }

    pub fn engine(&self) -> &dyn WorkflowEngine {
        self.engine.as_ref()
    }

    pub fn workflows(&self) -> Vec<WorkflowSummary> {
        self.engine
            .workflows()
            .iter()
            .map(|workflow| self.summary(workflow))
            .collect()
    }

    pub fn workflow(&self, id: i32) -> Option<WorkflowSummary> {
        self.engine.get_workflow(id).map(|workflow| self.summary(&workflow))
    }

    /// Decoded task list of a loaded workflow
    pub fn tasks(&self, id: i32) -> Option<Vec<TaskInfo>> {
        self.engine.get_workflow(id).map(|workflow| workflow.tasks.clone())
    }

    /// Document text of a loaded workflow, empty when not found
    pub fn xml(&self, id: i32) -> String {
        let Some(workflow) = self.engine.get_workflow(id) else {
            return String::new();
        };
        workflow.xml().unwrap_or_else(|e| {
            tracing::error!("Failed to serialize workflow {}: {}", id, e);
            String::new()
        })
    }

    /// Encode a JSON task as a namespace-less `Task` element, for previews
    pub fn task_to_xml(&self, json: &str) -> String {
        let result = serde_json::from_str::<TaskInfo>(json)
            .context("invalid task")
            .and_then(|task| Ok(writer::element_to_string(&task_codec::encode(&task, None))?));
        result.unwrap_or_else(|e| {
            tracing::error!("Failed to convert task to XML: {:#}", e);
            String::new()
        })
    }

    /// Create or update a workflow from a JSON save request
    pub fn save(&self, json: &str) -> bool {
        self.synchronizer.save_json(json)
    }

    /// Move the workflow file to the trash folder and forget the workflow
    pub fn delete(&self, id: i32) -> bool {
        match self.move_to_trash(id) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("❌ Failed to delete workflow {}: {:#}", id, e);
                false
            }
        }
    }

    pub fn execution_graph(&self, id: i32) -> Option<Vec<GraphNodeInfo>> {
        projector::execution_graph(self.engine.as_ref(), id)
    }

    /// True when no loaded workflow uses `id`
    pub fn is_workflow_id_valid(&self, id: i32) -> bool {
        self.engine.get_workflow(id).is_none()
    }

    pub fn is_cron_expression_valid(&self, expression: &str) -> bool {
        self.engine.is_cron_expression_valid(expression)
    }

    pub fn is_period_valid(&self, period: &str) -> bool {
        period.parse::<Period>().is_ok()
    }

    pub fn task_names(&self) -> Vec<String> {
        self.catalog.task_names()
    }

    pub fn task_settings(&self, task_name: &str) -> Vec<String> {
        self.catalog.task_settings(task_name)
    }

    pub fn workflows_folder(&self) -> &Path {
        &self.workflows_folder
    }

    fn summary(&self, workflow: &Workflow) -> WorkflowSummary {
        let state = self.engine.run_state(workflow.id);
        WorkflowSummary {
            id: workflow.id,
            name: workflow.name.clone(),
            launch_type: workflow.launch_type,
            is_enabled: workflow.is_enabled,
            description: workflow.description.clone(),
            is_running: state.is_running,
            is_paused: state.is_paused,
            period: workflow.period.to_string(),
            cron_expression: workflow.cron_expression.clone().unwrap_or_default(),
            path: workflow.file_path.display().to_string(),
            is_execution_graph_empty: workflow.graph.is_empty(),
        }
    }

    fn move_to_trash(&self, id: i32) -> Result<()> {
        let Some(workflow) = self.engine.get_workflow(id) else {
            tracing::debug!("Delete ignored: workflow {} not found", id);
            return Ok(());
        };

        std::fs::create_dir_all(&self.trash_folder)
            .with_context(|| format!("creating trash folder {}", self.trash_folder.display()))?;
        let destination = trash_destination(&self.trash_folder, &workflow.file_path)?;
        move_file(&workflow.file_path, &destination)?;

        self.engine.remove(id);
        tracing::info!("🗑️ Moved workflow {} to {}", id, destination.display());
        Ok(())
    }
}

/// Target path in the trash, suffixed with a timestamp when the name is taken
fn trash_destination(trash_folder: &Path, source: &Path) -> Result<PathBuf> {
    let file_name = source
        .file_name()
        .ok_or_else(|| anyhow!("workflow path {} has no file name", source.display()))?;
    let destination = trash_folder.join(file_name);
    if !destination.exists() {
        return Ok(destination);
    }

    let stem = source.file_stem().unwrap_or(file_name).to_string_lossy();
    let extension = source
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
    Ok(trash_folder.join(format!("{}_{}{}", stem, stamp, extension)))
}

fn move_file(from: &Path, to: &Path) -> Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    // rename fails across file systems
    std::fs::copy(from, to).with_context(|| format!("copying {} to {}", from.display(), to.display()))?;
    std::fs::remove_file(from).with_context(|| format!("removing {}", from.display()))?;
    Ok(())
}
