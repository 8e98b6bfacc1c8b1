//! Task API handlers.

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
use tally_tasks::{CreateTaskParams, Task, TaskStoreError, UpdateTaskParams};
use tally_types::TaskStatus;

fn map_store_error(e: TaskStoreError) -> ApiError {
    match e {
        TaskStoreError::ProjectNotFound(id) => ApiError::NotFound(format!("project not found: {id}")),
        TaskStoreError::TaskNotFound(id) => ApiError::NotFound(format!("task not found: {id}")),
        other => ApiError::InternalServerError(other.to_string()),
    }
}

fn parse_status(s: &str) -> Result<TaskStatus, ApiError> {
    TaskStatus::parse(s).ok_or_else(|| ApiError::BadRequest(format!("unknown task status: {s}")))
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    /// Defaults to the user's first project when omitted.
    pub project_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    /// One of TODO, IN_PROGRESS, COMPLETED; defaults to TODO.
    pub status: Option<String>,
    pub due_date: Option<String>,
}

/// Handler for `POST /api/tasks`.
pub async fn create_task_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("task title is required".to_string()));
    }
    let status = match payload.status.as_deref() {
        Some(s) => parse_status(s)?,
        None => TaskStatus::Todo,
    };

    let user_id = user.id;
    let task = tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;

        let project_id = match payload.project_id {
            Some(id) => {
                // Validates ownership as a side effect.
                tally_tasks::get_project(&conn, user_id, id)
                    .map_err(map_store_error)?
                    .id
            }
            None => tally_tasks::find_first_project(&conn, user_id)
                .map_err(map_store_error)?
                .ok_or_else(|| ApiError::NotFound("no active project for user".to_string()))?
                .id,
        };

        tally_tasks::create_task(
            &conn,
            &CreateTaskParams {
                user_id,
                project_id,
                title: payload.title.trim().to_string(),
                description: payload.description.unwrap_or_default(),
                status,
                due_date: payload.due_date,
            },
        )
        .map_err(|e| match e {
            TaskStoreError::Database(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                ApiError::Conflict("a task with this title already exists".to_string())
            }
            other => map_store_error(other),
        })
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Handler for `GET /api/tasks`.
pub async fn list_tasks_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let user_id = user.id;
    let tasks = tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;

        tally_tasks::list_tasks(&conn, user_id).map_err(map_store_error)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok(Json(tasks))
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<String>,
}

/// Handler for `PUT /api/tasks/:taskId`.
pub async fn update_task_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(task_id): Path<i64>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let status = match payload.status.as_deref() {
        Some(s) => Some(parse_status(s)?),
        None => None,
    };

    let user_id = user.id;
    let task = tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;

        tally_tasks::update_task(
            &conn,
            user_id,
            task_id,
            &UpdateTaskParams {
                title: payload.title,
                description: payload.description,
                status,
                due_date: payload.due_date.map(Some),
            },
        )
        .map_err(map_store_error)?;

        tally_tasks::get_task(&conn, user_id, task_id).map_err(map_store_error)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok(Json(task))
}

/// Handler for `DELETE /api/tasks/:taskId`.
pub async fn delete_task_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(task_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let user_id = user.id;
    tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;

        tally_tasks::delete_task(&conn, user_id, task_id).map_err(map_store_error)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok(StatusCode::NO_CONTENT)
}
