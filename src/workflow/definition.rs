/// Loaded workflow handle
///
/// A `Workflow` is the engine-side view of one persisted document: the
/// metadata read from its root and `Settings` block, the decoded task list,
/// the execution graph, and the document itself. Handles are immutable; an
/// edited document becomes a new handle through the registry.

use crate::codec::task as task_codec;
use crate::document::schema::{self, settings, ATTR_DESCRIPTION, ATTR_ID, ATTR_NAME, EXECUTION_GRAPH, NS, TASK, TASKS, WORKFLOW};
use crate::document::{reader, writer, Document, DocumentError};
use crate::runtime::graph::ExecutionGraph;
use crate::workflow::period::Period;
use crate::workflow::types::{LaunchType, TaskInfo};
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Workflow {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub launch_type: LaunchType,
    pub is_enabled: bool,
    pub period: Period,
    pub cron_expression: Option<String>,
    /// File the document was loaded from and is saved back to
    pub file_path: PathBuf,
    pub tasks: Vec<TaskInfo>,
    pub graph: ExecutionGraph,
    document: Document,
}

impl Workflow {
    /// Load and parse a workflow file
    pub fn load(path: &Path) -> Result<Self> {
        let document = reader::load(path)
            .with_context(|| format!("Failed to read workflow file {}", path.display()))?;
        Self::from_document(path.to_path_buf(), document)
    }

    /// Build a handle from an already parsed document
    pub fn from_document(file_path: PathBuf, document: Document) -> Result<Self> {
        let root = document.root();
        if !root.is(NS, WORKFLOW) {
            return Err(anyhow!(
                "Root element <{}> is not a {} in namespace {}",
                root.qualified_name(),
                WORKFLOW,
                schema::WORKFLOW_NS
            ));
        }

        let id_text = root
            .attribute(ATTR_ID)
            .ok_or_else(|| anyhow!("Workflow has no id attribute"))?;
        let id = id_text
            .trim()
            .parse()
            .map_err(|_| anyhow!("Workflow id '{}' is not a number", id_text))?;

        let launch_type_text = schema::setting_value(root, settings::LAUNCH_TYPE)
            .ok_or_else(|| anyhow!("Workflow {} has no launchType setting", id))?;
        let launch_type = LaunchType::from_name(launch_type_text)
            .ok_or_else(|| anyhow!("Workflow {} has unknown launch type '{}'", id, launch_type_text))?;

        let enabled_text = schema::setting_value(root, settings::ENABLED)
            .ok_or_else(|| anyhow!("Workflow {} has no enabled setting", id))?;
        let is_enabled = schema::parse_bool(enabled_text)
            .ok_or_else(|| anyhow!("Workflow {} has invalid enabled value '{}'", id, enabled_text))?;

        let period = Period::parse_or_zero(schema::setting_value(root, settings::PERIOD))
            .with_context(|| format!("Workflow {} has an invalid period", id))?;
        let cron_expression = schema::setting_value(root, settings::CRON_EXPRESSION)
            .filter(|cron| !cron.is_empty())
            .map(str::to_string);

        let tasks = match root.child(NS, TASKS) {
            Some(tasks) => tasks
                .children_named(NS, TASK)
                .map(task_codec::decode)
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("Workflow {} has an invalid task", id))?,
            None => Vec::new(),
        };

        let graph = ExecutionGraph::from_element(root.child(NS, EXECUTION_GRAPH))
            .with_context(|| format!("Workflow {} has an invalid execution graph", id))?;

        Ok(Self {
            id,
            name: root.attribute(ATTR_NAME).unwrap_or_default().to_string(),
            description: root.attribute(ATTR_DESCRIPTION).unwrap_or_default().to_string(),
            launch_type,
            is_enabled,
            period,
            cron_expression,
            file_path,
            tasks,
            graph,
            document,
        })
    }

    /// The document this handle was built from
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Serialized document text
    pub fn xml(&self) -> Result<String, DocumentError> {
        writer::to_string(&self.document)
    }

    /// First task with the given id
    pub fn task(&self, id: i32) -> Option<&TaskInfo> {
        self.tasks.iter().find(|task| task.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Workflow xmlns="urn:wexflow-schema" id="7" name="Copy" description="Copies files">
  <Settings>
    <Setting name="launchType" value="cron" />
    <Setting name="enabled" value="True" />
    <Setting name="cronExpression" value="0 0 12 * * *" />
  </Settings>
  <Tasks>
    <Task id="1" name="FilesLoader" description="Load" enabled="true">
      <Setting name="folder" value="/in" />
    </Task>
  </Tasks>
</Workflow>"#;

    #[test]
    fn reads_metadata_and_tasks() {
        let doc = reader::parse(SAMPLE).unwrap();
        let workflow = Workflow::from_document(PathBuf::from("/wf/7.xml"), doc).unwrap();

        assert_eq!(workflow.id, 7);
        assert_eq!(workflow.name, "Copy");
        assert_eq!(workflow.launch_type, LaunchType::Cron);
        assert!(workflow.is_enabled);
        assert_eq!(workflow.period, Period::ZERO);
        assert_eq!(workflow.cron_expression.as_deref(), Some("0 0 12 * * *"));
        assert_eq!(workflow.task(1).unwrap().settings[0].value.as_deref(), Some("/in"));
        assert!(workflow.graph.is_empty());
    }

    #[test]
    fn rejects_foreign_root_and_missing_settings() {
        let foreign = reader::parse(r#"<Workflow id="1"/>"#).unwrap();
        assert!(Workflow::from_document(PathBuf::new(), foreign).is_err());

        let bare = reader::parse(r#"<Workflow xmlns="urn:wexflow-schema" id="1"><Settings/></Workflow>"#).unwrap();
        assert!(Workflow::from_document(PathBuf::new(), bare).is_err());
    }
}
