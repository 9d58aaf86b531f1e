//! HTTP adapter for the meguri workflow engine.
//!
//! Every route delegates to a shared [`WorkflowService`]; responses carry the
//! full workflow as JSON, and failures carry `{ "error": message }`.

mod config;
mod error;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult, ErrorResponse, ServerError};

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use meguri::{
    Action, AddActionRequest, CreateWorkflowRequest, JsonFileStore, ServiceError, StateId,
    Workflow, WorkflowId, WorkflowService,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

type SharedService = Arc<WorkflowService>;

/// Builds the router over `service`.
pub fn router(service: SharedService) -> Router {
    Router::new()
        .route("/workflows", post(create_workflow).get(list_workflows))
        .route("/workflows/{id}", get(get_workflow))
        .route("/workflows/{id}/execute/{action_id}", post(execute_action))
        .route("/workflows/{id}/states", post(add_state))
        .route("/workflows/{id}/states/{state_id}/toggle", put(toggle_state))
        .route("/workflows/{id}/actions", post(add_action))
        .route("/workflows/{id}/actions/available", get(available_actions))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Opens the JSON store named by `config` and serves until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let store = Arc::new(JsonFileStore::new(&config.store_path));
    let service = Arc::new(WorkflowService::open(store).await?);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!(
        "meguri-server listening on {} (store: {})",
        listener.local_addr()?,
        config.store_path.display()
    );

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

async fn create_workflow(
    State(service): State<SharedService>,
    payload: Result<Json<CreateWorkflowRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Workflow>)> {
    let Json(request) = payload?;
    let definition = request.into_definition()?;
    let workflow = service.create(definition).await?;
    Ok((StatusCode::CREATED, Json(workflow)))
}

async fn list_workflows(State(service): State<SharedService>) -> Json<Vec<Workflow>> {
    Json(service.list().await)
}

async fn get_workflow(
    State(service): State<SharedService>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Workflow>> {
    let Path(id) = path?;
    let id = WorkflowId::new(id);
    match service.get(id).await {
        Some(workflow) => Ok(Json(workflow)),
        None => Err(ServiceError::WorkflowNotFound(id).into()),
    }
}

async fn execute_action(
    State(service): State<SharedService>,
    path: Result<Path<(i64, i64)>, PathRejection>,
) -> ApiResult<Json<Workflow>> {
    let Path((id, action_id)) = path?;
    let workflow = service.execute(id.into(), action_id.into()).await?;
    Ok(Json(workflow))
}

async fn add_state(
    State(service): State<SharedService>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<meguri::State>, JsonRejection>,
) -> ApiResult<Json<Workflow>> {
    let Path(id) = path?;
    let Json(state) = payload?;
    let workflow = service.add_state(id.into(), state).await?;
    Ok(Json(workflow))
}

#[derive(Debug, Deserialize)]
struct ToggleParams {
    enable: bool,
}

async fn toggle_state(
    State(service): State<SharedService>,
    path: Result<Path<(i64, i64)>, PathRejection>,
    query: Result<Query<ToggleParams>, QueryRejection>,
) -> ApiResult<Json<Workflow>> {
    let Path((id, state_id)) = path?;
    let Query(params) = query?;
    let workflow = service
        .toggle_state(id.into(), StateId::new(state_id), params.enable)
        .await?;
    Ok(Json(workflow))
}

async fn add_action(
    State(service): State<SharedService>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<AddActionRequest>, JsonRejection>,
) -> ApiResult<Json<Workflow>> {
    let Path(id) = path?;
    let Json(request) = payload?;
    let workflow = service.add_action(id.into(), request.into_record()).await?;
    Ok(Json(workflow))
}

async fn available_actions(
    State(service): State<SharedService>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Vec<Action>>> {
    let Path(id) = path?;
    let actions = service.available_actions(id.into()).await?;
    Ok(Json(actions))
}
