/// Workflow document synchronizer
///
/// Applies a save request to the persisted XML form of a workflow:
/// - creation path: builds a brand-new document and writes it to the path
///   given in the request
/// - update path: clones the engine's document, patches workflow metadata in
///   place, replaces the task list, builds the new handle, writes the document
///   back to the workflow's own file and hands the handle to the engine
///   through `reload`
///
/// Cron expressions are validated before anything is built or written, so an
/// invalid save never leaves a partial document behind.

use crate::codec::task as task_codec;
use crate::document::schema::{
    self, settings, ATTR_DESCRIPTION, ATTR_ID, ATTR_NAME, ATTR_VALUE, NS, SETTING, SETTINGS, TASK, TASKS, WORKFLOW,
    WORKFLOW_NS,
};
use crate::document::{writer, Document, DocumentError, Element};
use crate::runtime::engine::WorkflowEngine;
use crate::workflow::definition::Workflow;
use crate::workflow::period::{Period, PeriodError};
use crate::workflow::types::{LaunchType, SaveRequest, TaskInfo, WorkflowInfo};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

/// Result of a save that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new document was written to `path`
    Created { id: i32, path: PathBuf },
    /// The existing document of workflow `id` was rewritten
    Updated { id: i32, path: PathBuf },
    /// The update target does not exist; nothing was written
    NotFound { id: i32 },
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("invalid save request: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("The cron expression '{0}' is not valid.")]
    InvalidCron(String),

    #[error(transparent)]
    InvalidPeriod(#[from] PeriodError),

    #[error("a new workflow needs a target path")]
    MissingPath,

    #[error("workflow document has no {0}")]
    MissingElement(&'static str),

    #[error("workflow document has no '{0}' setting")]
    MissingSetting(&'static str),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("workflow id {id} is already used by {}", .path.display())]
    IdInUse { id: i32, path: PathBuf },

    #[error("updated workflow {id} would not load: {source:#}")]
    Unloadable { id: i32, source: anyhow::Error },

    #[error("failed to reload workflow {id}: {source:#}")]
    Reload { id: i32, source: anyhow::Error },
}

pub struct WorkflowSynchronizer {
    engine: Arc<dyn WorkflowEngine>,
    /// One lock per workflow id, serializing update-path saves
    locks: Mutex<HashMap<i32, Arc<Mutex<()>>>>,
}

impl WorkflowSynchronizer {
    pub fn new(engine: Arc<dyn WorkflowEngine>) -> Self {
        Self {
            engine,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Parse a JSON save request and apply it
    ///
    /// Every failure is logged and reported as `false`. A missing update
    /// target is reported as success, matching what existing clients expect.
    pub fn save_json(&self, json: &str) -> bool {
        let result = serde_json::from_str::<SaveRequest>(json)
            .map_err(SaveError::from)
            .and_then(|request| self.save(&request));

        match result {
            Ok(SaveOutcome::NotFound { id }) => {
                tracing::warn!("Save ignored: workflow {} not found", id);
                true
            }
            Ok(outcome) => {
                tracing::debug!("Save completed: {:?}", outcome);
                true
            }
            Err(e) => {
                tracing::error!("❌ Failed to save workflow: {}", e);
                false
            }
        }
    }

    /// Apply a save request, choosing the path from `IsNew`
    pub fn save(&self, request: &SaveRequest) -> Result<SaveOutcome, SaveError> {
        if request.workflow_info.is_new {
            self.create(&request.workflow_info, &request.tasks)
        } else {
            self.update(request.target_id(), &request.workflow_info, &request.tasks)
        }
    }

    /// Creation path: build a fresh document and write it to `info.path`
    pub fn create(&self, info: &WorkflowInfo, tasks: &[TaskInfo]) -> Result<SaveOutcome, SaveError> {
        self.check_cron(info)?;
        let path = info
            .path
            .as_deref()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .ok_or(SaveError::MissingPath)?;

        let document = build_document(info, info.period()?, tasks);
        writer::persist(&document, &path)?;
        tracing::info!("Created workflow {} ({}) at {}", info.id, info.name, path.display());

        if let Err(e) = self.engine.register(&path) {
            tracing::warn!("⚠️ Workflow {} written but not loaded: {:#}", info.id, e);
        }

        Ok(SaveOutcome::Created { id: info.id, path })
    }

    /// Update path: patch the document of workflow `id` and write it back
    pub fn update(&self, id: i32, info: &WorkflowInfo, tasks: &[TaskInfo]) -> Result<SaveOutcome, SaveError> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let Some(workflow) = self.engine.get_workflow(id) else {
            return Ok(SaveOutcome::NotFound { id });
        };

        self.check_cron(info)?;
        let period = info.period()?;

        if info.id != id {
            if let Some(other) = self.engine.get_workflow(info.id) {
                return Err(SaveError::IdInUse {
                    id: info.id,
                    path: other.file_path.clone(),
                });
            }
        }

        let mut document = workflow.document().clone();
        patch_document(&mut document, info, period, tasks)?;
        let updated = Workflow::from_document(workflow.file_path.clone(), document)
            .map_err(|source| SaveError::Unloadable { id, source })?;

        writer::persist(updated.document(), &updated.file_path)?;
        self.engine
            .reload(id, updated)
            .map_err(|source| SaveError::Reload { id, source })?;

        tracing::info!("Updated workflow {} ({}) at {}", info.id, info.name, workflow.file_path.display());
        Ok(SaveOutcome::Updated {
            id: info.id,
            path: workflow.file_path.clone(),
        })
    }

    fn check_cron(&self, info: &WorkflowInfo) -> Result<(), SaveError> {
        if info.launch_type == LaunchType::Cron && !self.engine.is_cron_expression_valid(info.cron_expression()) {
            return Err(SaveError::InvalidCron(info.cron_expression().to_string()));
        }
        Ok(())
    }

    fn lock_for(&self, id: i32) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(id).or_default())
    }
}

/// Build the full document of a new workflow
pub fn build_document(info: &WorkflowInfo, period: Period, tasks: &[TaskInfo]) -> Document {
    let settings_block = Element::new_ns(NS, SETTINGS)
        .with_child(schema::workflow_setting(settings::LAUNCH_TYPE, info.launch_type.as_str()))
        .with_child(schema::workflow_setting(settings::ENABLED, schema::bool_text(info.is_enabled)))
        .with_child(schema::workflow_setting(settings::PERIOD, period.to_string()))
        .with_child(schema::workflow_setting(settings::CRON_EXPRESSION, info.cron_expression()));

    let mut tasks_block = Element::new_ns(NS, TASKS);
    for task in tasks {
        tasks_block.push_child(task_codec::encode(task, NS));
    }

    let root = Element::new_ns(NS, WORKFLOW)
        .with_attribute(ATTR_ID, info.id.to_string())
        .with_attribute(ATTR_NAME, info.name.as_str())
        .with_attribute(ATTR_DESCRIPTION, info.description.as_str())
        .with_attribute("xmlns", WORKFLOW_NS)
        .with_child(settings_block)
        .with_child(tasks_block);

    Document::new(root)
}

/// Patch an existing document in place with the request's metadata and tasks
pub fn patch_document(
    document: &mut Document,
    info: &WorkflowInfo,
    period: Period,
    tasks: &[TaskInfo],
) -> Result<(), SaveError> {
    let root = document.root_mut();
    root.set_attribute(ATTR_ID, info.id.to_string());
    root.set_attribute(ATTR_NAME, info.name.as_str());
    root.set_attribute(ATTR_DESCRIPTION, info.description.as_str());

    let settings_block = root
        .child_mut(NS, SETTINGS)
        .ok_or(SaveError::MissingElement("Settings element"))?;

    overwrite_setting(settings_block, settings::ENABLED, schema::bool_text(info.is_enabled))?;
    overwrite_setting(settings_block, settings::LAUNCH_TYPE, info.launch_type.as_str())?;

    let period_text = period.to_string();
    if overwrite_setting(settings_block, settings::PERIOD, &period_text).is_err() {
        append_setting(settings_block, settings::PERIOD, &period_text);
    }

    let cron = info.cron_expression();
    if overwrite_setting(settings_block, settings::CRON_EXPRESSION, cron).is_err() && !cron.is_empty() {
        append_setting(settings_block, settings::CRON_EXPRESSION, cron);
    }

    let tasks_block = root
        .child_mut(NS, TASKS)
        .ok_or(SaveError::MissingElement("Tasks element"))?;
    let removed = tasks_block.remove_children_named(NS, TASK);
    let prefix = tasks_block.prefix().map(str::to_string);
    for task in tasks {
        let mut element = task_codec::encode(task, NS);
        element.adopt_prefix(prefix.as_deref());
        tasks_block.push_child(element);
    }
    tracing::debug!("Replaced {} tasks with {} tasks", removed, tasks.len());

    Ok(())
}

fn overwrite_setting(settings_block: &mut Element, name: &'static str, value: &str) -> Result<(), SaveError> {
    let setting = settings_block
        .child_with_attribute_mut(NS, SETTING, ATTR_NAME, name)
        .ok_or(SaveError::MissingSetting(name))?;
    setting.set_attribute(ATTR_VALUE, value);
    Ok(())
}

fn append_setting(settings_block: &mut Element, name: &str, value: &str) {
    let mut setting = schema::workflow_setting(name, value);
    setting.adopt_prefix(settings_block.prefix());
    settings_block.push_child(setting);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::reader;
    use crate::workflow::types::SettingInfo;

    fn info(launch_type: LaunchType, cron: Option<&str>) -> WorkflowInfo {
        WorkflowInfo {
            id: 3,
            name: "wf3".into(),
            description: "desc".into(),
            launch_type,
            period: Some("01:00:00".into()),
            cron_expression: cron.map(str::to_string),
            is_enabled: false,
            is_new: false,
            path: None,
        }
    }

    fn task(id: i32) -> TaskInfo {
        TaskInfo {
            id,
            name: "Wait".into(),
            description: format!("task {id}"),
            is_enabled: true,
            settings: vec![SettingInfo {
                name: "duration".into(),
                value: Some("00:00:05".into()),
                attributes: vec![],
            }],
        }
    }

    #[test]
    fn built_document_has_fixed_settings() {
        let document = build_document(&info(LaunchType::Manual, None), Period::from_secs(3600), &[task(1)]);
        let root = document.root();

        assert!(root.is(NS, "Workflow"));
        assert_eq!(root.attribute("xmlns"), Some(WORKFLOW_NS));
        assert_eq!(schema::setting_value(root, "launchType"), Some("manual"));
        assert_eq!(schema::setting_value(root, "enabled"), Some("false"));
        assert_eq!(schema::setting_value(root, "period"), Some("00.01:00:00"));
        assert_eq!(schema::setting_value(root, "cronExpression"), Some(""));
        assert_eq!(root.child(NS, "Tasks").unwrap().elements().count(), 1);
    }

    #[test]
    fn patch_appends_missing_optional_settings() {
        let mut document = reader::parse(
            r#"<Workflow xmlns="urn:wexflow-schema" id="3" name="old" description="old">
  <Settings>
    <Setting name="launchType" value="periodic" />
    <Setting name="enabled" value="true" />
  </Settings>
  <Tasks>
    <Task id="9" name="Old" description="" enabled="true" />
  </Tasks>
  <ExecutionGraph />
</Workflow>"#,
        )
        .unwrap();

        patch_document(
            &mut document,
            &info(LaunchType::Cron, Some("0 0 * * * *")),
            Period::from_secs(3600),
            &[task(1), task(2)],
        )
        .unwrap();

        let root = document.root();
        assert_eq!(root.attribute("name"), Some("wf3"));
        assert_eq!(schema::setting_value(root, "launchType"), Some("cron"));
        assert_eq!(schema::setting_value(root, "period"), Some("00.01:00:00"));
        assert_eq!(schema::setting_value(root, "cronExpression"), Some("0 0 * * * *"));
        let ids: Vec<_> = root
            .child(NS, "Tasks")
            .unwrap()
            .elements()
            .map(|task| task.attribute("id").unwrap())
            .collect();
        assert_eq!(ids, ["1", "2"]);
        assert!(root.child(NS, "ExecutionGraph").is_some());
    }

    #[test]
    fn patch_skips_empty_cron_when_absent() {
        let mut document = reader::parse(
            r#"<Workflow xmlns="urn:wexflow-schema" id="3"><Settings><Setting name="launchType" value="manual"/><Setting name="enabled" value="true"/></Settings><Tasks/></Workflow>"#,
        )
        .unwrap();
        patch_document(&mut document, &info(LaunchType::Manual, None), Period::ZERO, &[]).unwrap();
        assert_eq!(schema::setting_value(document.root(), "cronExpression"), None);
    }

    #[test]
    fn patch_keeps_prefix_of_prefixed_documents() {
        let mut document = reader::parse(
            r#"<wf:Workflow xmlns:wf="urn:wexflow-schema" id="3"><wf:Settings><wf:Setting name="launchType" value="manual"/><wf:Setting name="enabled" value="true"/></wf:Settings><wf:Tasks/></wf:Workflow>"#,
        )
        .unwrap();
        patch_document(&mut document, &info(LaunchType::Manual, None), Period::ZERO, &[task(1)]).unwrap();

        let xml = writer::to_string(&document).unwrap();
        assert!(xml.contains("<wf:Task "), "{xml}");
        assert!(xml.contains("<wf:Setting name=\"period\""), "{xml}");

        let reparsed = reader::parse(&xml).unwrap();
        let tasks = reparsed.root().child(NS, "Tasks").unwrap();
        assert_eq!(tasks.children_named(NS, "Task").count(), 1);
    }

    #[test]
    fn patch_requires_enabled_and_launch_type() {
        let mut document = reader::parse(
            r#"<Workflow xmlns="urn:wexflow-schema" id="3"><Settings><Setting name="enabled" value="true"/></Settings><Tasks/></Workflow>"#,
        )
        .unwrap();
        let err = patch_document(&mut document, &info(LaunchType::Manual, None), Period::ZERO, &[]).unwrap_err();
        assert!(matches!(err, SaveError::MissingSetting("launchType")));
    }
}
