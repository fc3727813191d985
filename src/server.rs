/// Server setup and initialization
///
/// Wires together the registry, the workflow service and the HTTP routes.
/// Provides the main application factory function for creating the Axum app.

use crate::{
    api::workflows::{create_workflow_routes, AppState},
    catalog::TaskCatalog,
    config::Config,
    runtime::engine::WorkflowEngine,
    workflow::{registry::WorkflowRegistry, service::WorkflowService},
};
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Create the main Axum application with all routes
///
/// Ensures the workflow and trash folders exist, loads every workflow
/// document found in the workflows folder and mounts the API.
pub async fn create_app(config: Config) -> Result<Router> {
    let engine_config = &config.engine;

    tracing::info!("📁 Ensuring workflows folder exists: {}", engine_config.workflows_folder.display());
    std::fs::create_dir_all(&engine_config.workflows_folder).with_context(|| {
        format!("Failed to create workflows folder {}", engine_config.workflows_folder.display())
    })?;
    std::fs::create_dir_all(&engine_config.trash_folder)
        .with_context(|| format!("Failed to create trash folder {}", engine_config.trash_folder.display()))?;

    tracing::info!("📊 Initializing workflow registry");
    let registry = Arc::new(WorkflowRegistry::new(engine_config.workflows_folder.clone()));

    tracing::info!("📥 Loading existing workflows from folder");
    let registry_for_load = Arc::clone(&registry);
    let loaded = tokio::task::spawn_blocking(move || registry_for_load.init_from_folder())
        .await
        .context("Workflow loading task failed")??;
    tracing::debug!("Loaded {} workflows", loaded);

    let catalog = TaskCatalog::new(
        engine_config.tasks_names_file.clone(),
        engine_config.tasks_settings_file.clone(),
    );
    let engine: Arc<dyn WorkflowEngine> = registry;
    let service = Arc::new(WorkflowService::new(
        engine,
        catalog,
        engine_config.workflows_folder.clone(),
        engine_config.trash_folder.clone(),
    ));

    tracing::info!("📡 Creating HTTP router with all endpoints");
    let app = Router::new()
        .route("/healthz", get(health_check))
        .merge(create_workflow_routes().with_state(AppState { service }));

    tracing::info!("✅ Application initialized successfully");

    Ok(app)
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting flowdoc server...");

    let app = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "ok"
}
