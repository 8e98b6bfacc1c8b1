//! Project API handlers.

use crate::middleware::CurrentUser;
use crate::{api::ApiError, AppState};
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tally_tasks::{Project, TaskStoreError};

fn map_store_error(e: TaskStoreError) -> ApiError {
    match e {
        TaskStoreError::ProjectNotFound(id) => ApiError::NotFound(format!("project not found: {id}")),
        TaskStoreError::TaskNotFound(id) => ApiError::NotFound(format!("task not found: {id}")),
        other => ApiError::InternalServerError(other.to_string()),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
}

/// Handler for `POST /api/projects`.
pub async fn create_project_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("project name is required".to_string()));
    }

    let user_id = user.id;
    let project = tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;

        tally_tasks::create_project(
            &conn,
            user_id,
            payload.name.trim(),
            payload.description.as_deref(),
        )
        .map_err(map_store_error)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok((StatusCode::CREATED, Json(project)))
}

/// Handler for `GET /api/projects`.
pub async fn list_projects_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<Project>>, ApiError> {
    let user_id = user.id;
    let projects = tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;

        tally_tasks::list_projects(&conn, user_id).map_err(map_store_error)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok(Json(projects))
}

/// Handler for `GET /api/projects/:projectId`.
pub async fn get_project_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_id): Path<i64>,
) -> Result<Json<Project>, ApiError> {
    let user_id = user.id;
    let project = tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;

        tally_tasks::get_project(&conn, user_id, project_id).map_err(map_store_error)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok(Json(project))
}

/// Handler for `DELETE /api/projects/:projectId`.
pub async fn delete_project_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let user_id = user.id;
    tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;

        tally_tasks::delete_project(&conn, user_id, project_id).map_err(map_store_error)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok(StatusCode::NO_CONTENT)
}
