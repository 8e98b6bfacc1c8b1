//! Presentation API handlers, including LLM-drafted slide outlines.

use crate::middleware::CurrentUser;
use crate::presentations::{self, Presentation, PresentationStoreError};
use crate::{api::ApiError, AppState};
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tally_extract::extract_json_payload;

/// Instruction prefix for outline drafting. The topic is appended after it.
const OUTLINE_INSTRUCTIONS: &str = "\
Draft a slide outline for the presentation topic below.

Respond with ONLY a JSON object inside a fenced code block, shaped as:

```json
{
  \"title\": \"presentation title\",
  \"data\": {
    \"slides\": [{\"title\": \"slide title\", \"content\": [\"bullet\", \"bullet\"]}],
    \"talking_points\": [\"point\", \"point\"]
  }
}
```

Topic:
";

/// The outline shape the model must return.
#[derive(Debug, Deserialize)]
struct GeneratedOutline {
    title: String,
    data: Value,
}

fn map_store_error(e: PresentationStoreError) -> ApiError {
    match e {
        PresentationStoreError::NotFound(id) => {
            ApiError::NotFound(format!("presentation not found: {id}"))
        }
        other => ApiError::InternalServerError(other.to_string()),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePresentationRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct CreatePresentationResponse {
    pub message: String,
    pub presentation_id: i64,
    pub title: String,
}

/// Handler for `POST /api/presentations`.
///
/// Asks the language model to draft a slide outline for the prompt and
/// persists the result. Unlike transcript classification, an unusable
/// model reply here is surfaced as an error: there is no sensible empty
/// presentation to degrade to.
pub async fn create_presentation_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreatePresentationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("prompt is required".to_string()));
    }

    let prompt = format!("{OUTLINE_INSTRUCTIONS}{}", payload.prompt);
    let response = state.llm.complete(&prompt).await.map_err(|e| {
        tracing::warn!(error = %e, "outline drafting call failed");
        ApiError::InternalServerError("language model request failed".to_string())
    })?;

    let outline: GeneratedOutline = parse_outline(&response).map_err(|e| {
        tracing::warn!(error = %e, "model returned an unusable outline");
        ApiError::InternalServerError("model returned an unusable outline".to_string())
    })?;

    let user_id = user.id;
    let stored = tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;

        presentations::create_presentation(
            &conn,
            user_id,
            &outline.title,
            None,
            &outline.data,
        )
        .map_err(map_store_error)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok((
        StatusCode::CREATED,
        Json(CreatePresentationResponse {
            message: "Presentation created successfully".to_string(),
            presentation_id: stored.id,
            title: stored.title,
        }),
    ))
}

/// Direct parse first, embedded-payload search second. The same tolerance
/// the transcript classifier applies to model replies.
fn parse_outline(response: &str) -> Result<GeneratedOutline, String> {
    if let Ok(outline) = serde_json::from_str(response.trim()) {
        return Ok(outline);
    }
    let value = extract_json_payload(response).map_err(|e| e.to_string())?;
    serde_json::from_value(value).map_err(|e| e.to_string())
}

/// Handler for `GET /api/presentations`.
pub async fn list_presentations_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<Presentation>>, ApiError> {
    let user_id = user.id;
    let listed = tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;

        presentations::list_presentations(&conn, user_id).map_err(map_store_error)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok(Json(listed))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePresentationRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Handler for `PUT /api/presentations/:presentationId`.
///
/// Only the owner may update; anyone else gets 403.
pub async fn update_presentation_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(presentation_id): Path<i64>,
    Json(payload): Json<UpdatePresentationRequest>,
) -> Result<Json<Presentation>, ApiError> {
    let user_id = user.id;
    let updated = tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;

        check_owner(&conn, presentation_id, user_id)?;

        presentations::update_presentation(
            &conn,
            presentation_id,
            payload.title.as_deref(),
            payload.description.as_deref(),
        )
        .map_err(map_store_error)?;

        presentations::get_presentation(&conn, presentation_id)
            .map_err(map_store_error)?
            .ok_or_else(|| ApiError::NotFound(format!("presentation not found: {presentation_id}")))
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok(Json(updated))
}

/// Handler for `DELETE /api/presentations/:presentationId`.
pub async fn delete_presentation_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(presentation_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let user_id = user.id;
    tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;

        check_owner(&conn, presentation_id, user_id)?;
        presentations::delete_presentation(&conn, presentation_id).map_err(map_store_error)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok(StatusCode::NO_CONTENT)
}

fn check_owner(
    conn: &rusqlite::Connection,
    presentation_id: i64,
    user_id: i64,
) -> Result<(), ApiError> {
    let stored = presentations::get_presentation(conn, presentation_id)
        .map_err(map_store_error)?
        .ok_or_else(|| ApiError::NotFound(format!("presentation not found: {presentation_id}")))?;

    if stored.user_id != user_id {
        return Err(ApiError::Forbidden(
            "presentation belongs to another user".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_parses_from_prose_wrapped_reply() {
        let reply = r#"
        Here is your outline:
        {
            "data": {
                "slides": [
                    {"title": "Introduction", "content": ["Point 1", "Point 2"]},
                    {"title": "Conclusion", "content": ["Point 5", "Point 6"]}
                ],
                "talking_points": ["Talk point 1", "Talk point 2"]
            },
            "title": "Sample Presentation"
        }
        "#;
        let outline = parse_outline(reply).unwrap();
        assert_eq!(outline.title, "Sample Presentation");
        assert_eq!(outline.data["slides"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn outline_rejects_reply_without_structure() {
        assert!(parse_outline("I could not draft that.").is_err());
    }
}
