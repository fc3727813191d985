/// Workflow management REST API endpoints
///
/// Thin handlers over `WorkflowService`. Read paths answer `null`, an empty
/// string or `false` instead of error statuses; save and delete touch the
/// file system and run on the blocking pool.

use crate::workflow::{
    service::WorkflowService,
    types::{GraphNodeInfo, TaskInfo, WorkflowSummary},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Workflow operations backed by the hot-reload registry
    pub service: Arc<WorkflowService>,
}

/// Query of `GET /api/isCronExpressionValid`
#[derive(Debug, Deserialize)]
pub struct CronQuery {
    #[serde(default)]
    pub e: String,
}

/// Create workflow management routes
pub fn create_workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/workflows", get(list_workflows))
        .route("/api/workflow/{id}", get(get_workflow))
        .route("/api/tasks/{id}", get(get_tasks))
        .route("/api/xml/{id}", get(get_xml))
        .route("/api/taskToXml", post(task_to_xml))
        .route("/api/save", post(save_workflow))
        .route("/api/start/{id}", post(start_workflow))
        .route("/api/stop/{id}", post(stop_workflow))
        .route("/api/suspend/{id}", post(suspend_workflow))
        .route("/api/resume/{id}", post(resume_workflow))
        .route("/api/delete/{id}", post(delete_workflow))
        .route("/api/graph/{id}", get(execution_graph))
        .route("/api/taskNames", get(task_names))
        .route("/api/settings/{task_name}", get(task_settings))
        .route("/api/workflowsFolder", get(workflows_folder))
        .route("/api/isWorkflowIdValid/{id}", get(is_workflow_id_valid))
        .route("/api/isCronExpressionValid", get(is_cron_expression_valid))
        .route("/api/isPeriodValid/{period}", get(is_period_valid))
}

/// GET /api/workflows
async fn list_workflows(State(state): State<AppState>) -> Json<Vec<WorkflowSummary>> {
    Json(state.service.workflows())
}

/// GET /api/workflow/{id}
async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Json<Option<WorkflowSummary>> {
    Json(state.service.workflow(id))
}

/// GET /api/tasks/{id}
async fn get_tasks(State(state): State<AppState>, Path(id): Path<i32>) -> Json<Option<Vec<TaskInfo>>> {
    Json(state.service.tasks(id))
}

/// GET /api/xml/{id}
async fn get_xml(State(state): State<AppState>, Path(id): Path<i32>) -> Json<String> {
    Json(state.service.xml(id))
}

/// POST /api/taskToXml
///
/// Body: a single task in its JSON form. Returns the `Task` element text.
async fn task_to_xml(State(state): State<AppState>, body: String) -> Json<String> {
    Json(state.service.task_to_xml(&body))
}

/// POST /api/save
///
/// Body: `{ "Id": ..., "WorkflowInfo": {...}, "Tasks": [...] }`
async fn save_workflow(State(state): State<AppState>, body: String) -> Result<Json<bool>, StatusCode> {
    let service = Arc::clone(&state.service);
    let saved = tokio::task::spawn_blocking(move || service.save(&body))
        .await
        .map_err(|e| {
            tracing::error!("Save task panicked: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(saved))
}

/// POST /api/start/{id}
async fn start_workflow(State(state): State<AppState>, Path(id): Path<i32>) -> StatusCode {
    state.service.engine().start_workflow(id);
    StatusCode::OK
}

/// POST /api/stop/{id}
async fn stop_workflow(State(state): State<AppState>, Path(id): Path<i32>) -> StatusCode {
    state.service.engine().stop_workflow(id);
    StatusCode::OK
}

/// POST /api/suspend/{id}
async fn suspend_workflow(State(state): State<AppState>, Path(id): Path<i32>) -> StatusCode {
    state.service.engine().pause_workflow(id);
    StatusCode::OK
}

/// POST /api/resume/{id}
async fn resume_workflow(State(state): State<AppState>, Path(id): Path<i32>) -> StatusCode {
    state.service.engine().resume_workflow(id);
    StatusCode::OK
}

/// POST /api/delete/{id}
async fn delete_workflow(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<bool>, StatusCode> {
    let service = Arc::clone(&state.service);
    let deleted = tokio::task::spawn_blocking(move || service.delete(id))
        .await
        .map_err(|e| {
            tracing::error!("Delete task panicked: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(deleted))
}

/// GET /api/graph/{id}
async fn execution_graph(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Json<Option<Vec<GraphNodeInfo>>> {
    Json(state.service.execution_graph(id))
}

/// GET /api/taskNames
async fn task_names(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.service.task_names())
}

/// GET /api/settings/{task_name}
async fn task_settings(State(state): State<AppState>, Path(task_name): Path<String>) -> Json<Vec<String>> {
    Json(state.service.task_settings(&task_name))
}

/// GET /api/workflowsFolder
async fn workflows_folder(State(state): State<AppState>) -> Json<String> {
    Json(state.service.workflows_folder().display().to_string())
}

/// GET /api/isWorkflowIdValid/{id}
///
/// Non-numeric ids are never valid.
async fn is_workflow_id_valid(State(state): State<AppState>, Path(id): Path<String>) -> Json<bool> {
    let valid = id
        .trim()
        .parse::<i32>()
        .map(|id| state.service.is_workflow_id_valid(id))
        .unwrap_or(false);
    Json(valid)
}

/// GET /api/isCronExpressionValid?e=...
async fn is_cron_expression_valid(State(state): State<AppState>, Query(query): Query<CronQuery>) -> Json<bool> {
    Json(state.service.is_cron_expression_valid(&query.e))
}

/// GET /api/isPeriodValid/{period}
async fn is_period_valid(State(state): State<AppState>, Path(period): Path<String>) -> Json<bool> {
    Json(state.service.is_period_valid(&period))
}
