//! Shared test support: a scripted language model and app setup helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tally_db::{create_pool, run_migrations, DbPool, DbSettings};
use tally_extract::{LanguageModel, LlmError};
use tally_server::auth::AuthConfig;
use tally_server::{app, AppState};
use tempfile::TempDir;
use tower::ServiceExt;

/// A language model that replays canned replies in order. Calls beyond
/// the script fail like an outage.
pub struct ScriptedLlm {
    replies: Mutex<Vec<Result<String, String>>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Result<String, String>>) -> Self {
        Self {
            replies: Mutex::new(replies),
        }
    }

    pub fn unused() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl LanguageModel for ScriptedLlm {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Err(LlmError::MissingContent);
        }
        match replies.remove(0) {
            Ok(reply) => Ok(reply),
            Err(body) => Err(LlmError::Status { status: 500, body }),
        }
    }
}

/// Builds an app over a temp-file database. The `TempDir` must be kept
/// alive for the duration of the test.
pub fn setup_app(llm: ScriptedLlm) -> (Router, DbPool, TempDir) {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let db_path = dir.path().join("test.db");

    let pool = create_pool(
        db_path.to_str().unwrap(),
        DbSettings {
            busy_timeout_ms: 5_000,
            max_connections: 2,
        },
    )
    .expect("pool creation should succeed");
    {
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();
    }

    let state = AppState::new(pool.clone(), AuthConfig::default(), Arc::new(llm));
    (app(state), pool, dir)
}

/// Sends a JSON request and returns status plus decoded body. An empty
/// body decodes as `null`.
pub async fn send_json(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(path).method(method);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Signs up a user and returns `(user_id, access_token, refresh_token)`.
pub async fn signup(app: &Router, username: &str, email: &str) -> (i64, String, String) {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/auth/signup",
        None,
        Some(serde_json::json!({
            "username": username,
            "email": email,
            "password": "testpass123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");

    (
        body["user"]["id"].as_i64().unwrap(),
        body["tokens"]["access"].as_str().unwrap().to_string(),
        body["tokens"]["refresh"].as_str().unwrap().to_string(),
    )
}

/// Creates a project for the authenticated user and returns its id.
pub async fn create_project(app: &Router, token: &str, name: &str) -> i64 {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/projects",
        Some(token),
        Some(serde_json::json!({"name": name})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "project creation failed: {body}");
    body["id"].as_i64().unwrap()
}
