/// Hot-reload workflow registry using ArcSwap
///
/// Holds every workflow loaded from the workflows folder. Reads are lock-free;
/// each change clones the map, edits it and swaps the pointer, so readers see
/// either the old or the new handle, never a half-edited one. Changes are
/// serialized by a writer mutex so concurrent swaps cannot drop each other.

use crate::runtime::engine::{RunState, WorkflowEngine};
use crate::workflow::definition::Workflow;
use anyhow::{anyhow, Result};
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

#[derive(Debug)]
pub struct WorkflowRegistry {
    /// Key: workflow id
    workflows: ArcSwap<HashMap<i32, Arc<Workflow>>>,
    /// Run flags, kept apart so a reload does not reset them
    states: RwLock<HashMap<i32, RunState>>,
    /// Held for every load-clone-store of `workflows`
    writer: Mutex<()>,
    workflows_folder: PathBuf,
}

impl WorkflowRegistry {
    pub fn new(workflows_folder: impl Into<PathBuf>) -> Self {
        Self {
            workflows: ArcSwap::new(Arc::new(HashMap::new())),
            states: RwLock::new(HashMap::new()),
            writer: Mutex::new(()),
            workflows_folder: workflows_folder.into(),
        }
    }

    pub fn workflows_folder(&self) -> &Path {
        &self.workflows_folder
    }

    /// Load every `*.xml` file of the workflows folder
    ///
    /// Files that fail to parse, and files reusing an id already loaded, are
    /// skipped with a warning.
    pub fn init_from_folder(&self) -> Result<usize> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.workflows_folder)
            .map_err(|e| {
                anyhow!(
                    "Failed to read workflows folder {}: {}",
                    self.workflows_folder.display(),
                    e
                )
            })?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
            })
            .collect();
        paths.sort();

        let mut loaded: HashMap<i32, Arc<Workflow>> = HashMap::new();
        for path in paths {
            match Workflow::load(&path) {
                Ok(workflow) => {
                    if let Some(existing) = loaded.get(&workflow.id) {
                        tracing::warn!(
                            "⚠️ Skipping {}: workflow id {} is already used by {}",
                            path.display(),
                            workflow.id,
                            existing.file_path.display()
                        );
                        continue;
                    }
                    tracing::debug!("📄 Loaded workflow {} from {}", workflow.id, path.display());
                    loaded.insert(workflow.id, Arc::new(workflow));
                }
                Err(e) => tracing::warn!("⚠️ Skipping {}: {:#}", path.display(), e),
            }
        }

        let count = loaded.len();
        let _writer = self.lock_writer();
        self.workflows.store(Arc::new(loaded));
        tracing::info!(
            "Initialized workflow registry with {} workflows from {}",
            count,
            self.workflows_folder.display()
        );
        Ok(count)
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace a handle, dropping `previous_id` when the id changed
    ///
    /// An id already held by a workflow from another file is never replaced.
    fn install(&self, previous_id: Option<i32>, workflow: Workflow) -> Result<Arc<Workflow>> {
        let _writer = self.lock_writer();
        let current = self.workflows.load();
        if let Some(existing) = current.get(&workflow.id) {
            if existing.file_path != workflow.file_path {
                return Err(anyhow!(
                    "Workflow id {} is already used by {}",
                    workflow.id,
                    existing.file_path.display()
                ));
            }
        }

        let workflow = Arc::new(workflow);
        let mut next = (**current).clone();
        if let Some(previous_id) = previous_id.filter(|previous| *previous != workflow.id) {
            next.remove(&previous_id);
            let mut states = self.states.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(state) = states.remove(&previous_id) {
                states.insert(workflow.id, state);
            }
        }
        next.insert(workflow.id, Arc::clone(&workflow));
        self.workflows.store(Arc::new(next));
        Ok(workflow)
    }

    fn update_state(&self, id: i32, action: &str, change: impl FnOnce(&mut RunState)) {
        if self.get_workflow(id).is_none() {
            tracing::warn!("Cannot {} workflow {}: not found", action, id);
            return;
        }
        let mut states = self.states.write().unwrap_or_else(PoisonError::into_inner);
        let state = states.entry(id).or_default();
        change(state);
        tracing::info!(
            "Workflow {} {} (running: {}, paused: {})",
            id,
            action,
            state.is_running,
            state.is_paused
        );
    }
}

impl WorkflowEngine for WorkflowRegistry {
    fn get_workflow(&self, id: i32) -> Option<Arc<Workflow>> {
        self.workflows.load().get(&id).cloned()
    }

    fn workflows(&self) -> Vec<Arc<Workflow>> {
        let mut workflows: Vec<_> = self.workflows.load().values().cloned().collect();
        workflows.sort_by_key(|workflow| workflow.id);
        workflows
    }

    fn run_state(&self, id: i32) -> RunState {
        self.states
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied()
            .unwrap_or_default()
    }

    fn start_workflow(&self, id: i32) {
        self.update_state(id, "start", |state| {
            state.is_running = true;
            state.is_paused = false;
        });
    }

    fn stop_workflow(&self, id: i32) {
        self.update_state(id, "stop", |state| *state = RunState::default());
    }

    fn pause_workflow(&self, id: i32) {
        self.update_state(id, "pause", |state| {
            if state.is_running {
                state.is_paused = true;
            }
        });
    }

    fn resume_workflow(&self, id: i32) {
        self.update_state(id, "resume", |state| state.is_paused = false);
    }

    fn reload(&self, previous_id: i32, workflow: Workflow) -> Result<Arc<Workflow>> {
        let workflow = self.install(Some(previous_id), workflow)?;
        tracing::info!("🔥 Hot-reloaded workflow: {} ({})", workflow.id, workflow.name);
        Ok(workflow)
    }

    fn register(&self, path: &Path) -> Result<Arc<Workflow>> {
        let workflow = self.install(None, Workflow::load(path)?)?;
        tracing::info!("Registered workflow: {} ({})", workflow.id, workflow.name);
        Ok(workflow)
    }

    fn remove(&self, id: i32) {
        let _writer = self.lock_writer();
        let current = self.workflows.load();
        let mut next = (**current).clone();
        if next.remove(&id).is_some() {
            self.workflows.store(Arc::new(next));
            self.states
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&id);
            tracing::info!("Removed workflow from registry: {}", id);
        }
    }
}
