//! Transcript processing handler: classification plus reconciliation.

use crate::middleware::CurrentUser;
use crate::{api::ApiError, AppState};
use axum::{extract::Extension, Json};
use serde::Deserialize;
use std::sync::Arc;
use tally_tasks::ReconcileError;
use tally_types::TaskExtractionResult;

#[derive(Debug, Deserialize)]
pub struct ProcessTranscriptRequest {
    pub transcript: String,
}

/// Handler for `POST /api/transcript/process`.
///
/// Classifies the transcript into task updates and reconciles them
/// against the caller's task list. Returns the extraction result that was
/// applied.
///
/// A transcript that yields no actionable tasks and a failed extraction
/// both return empty arrays — the classifier degrades to empty by design,
/// and only its logs tell the two apart.
pub async fn process_transcript_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<ProcessTranscriptRequest>,
) -> Result<Json<TaskExtractionResult>, ApiError> {
    if payload.transcript.trim().is_empty() {
        return Err(ApiError::BadRequest("transcript is required".to_string()));
    }

    let extraction = state.classifier.classify(&payload.transcript).await;

    let user_id = user.id;
    let applied = extraction.clone();
    tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;

        tally_tasks::reconcile_tasks(
            &conn,
            user_id,
            &applied.completed_tasks,
            &applied.new_tasks,
        )
        .map_err(|e| match e {
            ReconcileError::NoActiveProject(_) => {
                ApiError::NotFound("no active project for user".to_string())
            }
            ReconcileError::Store(e) => ApiError::InternalServerError(e.to_string()),
        })
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok(Json(extraction))
}
