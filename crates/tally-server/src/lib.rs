//! Tally server library logic.

pub mod api;
pub mod api_auth;
pub mod api_presentations;
pub mod api_projects;
pub mod api_tasks;
pub mod api_transcript;
pub mod auth;
pub mod config;
pub mod middleware;
pub mod presentations;
pub mod users;

use auth::AuthConfig;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tally_db::DbPool;
use tally_extract::{LanguageModel, TranscriptClassifier};
use tower_http::cors::{Any, CorsLayer};

/// Maximum request body size (1 MiB). Protects against OOM from oversized
/// payloads; the largest legitimate body is a conversation transcript.
const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Token issuance and password hashing settings.
    pub auth: AuthConfig,
    /// The language model used for presentation drafting.
    pub llm: Arc<dyn LanguageModel>,
    /// Transcript classifier (wraps the same model).
    pub classifier: TranscriptClassifier,
}

impl AppState {
    /// Builds state from a pool, auth settings, and a language model.
    pub fn new(pool: DbPool, auth: AuthConfig, llm: Arc<dyn LanguageModel>) -> Self {
        let classifier = TranscriptClassifier::new(llm.clone());
        Self {
            pool,
            auth,
            llm,
            classifier,
        }
    }
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/auth/logout", post(api_auth::logout_handler))
        .route("/api/auth/select-role", post(api_auth::select_role_handler))
        .route(
            "/api/projects",
            post(api_projects::create_project_handler).get(api_projects::list_projects_handler),
        )
        .route(
            "/api/projects/{projectId}",
            get(api_projects::get_project_handler).delete(api_projects::delete_project_handler),
        )
        .route(
            "/api/tasks",
            post(api_tasks::create_task_handler).get(api_tasks::list_tasks_handler),
        )
        .route(
            "/api/tasks/{taskId}",
            put(api_tasks::update_task_handler).delete(api_tasks::delete_task_handler),
        )
        .route(
            "/api/presentations",
            post(api_presentations::create_presentation_handler)
                .get(api_presentations::list_presentations_handler),
        )
        .route(
            "/api/presentations/{presentationId}",
            put(api_presentations::update_presentation_handler)
                .delete(api_presentations::delete_presentation_handler),
        )
        .route(
            "/api/transcript/process",
            post(api_transcript::process_transcript_handler),
        )
        .layer(axum::middleware::from_fn(middleware::auth_middleware));

    Router::new()
        .route("/health", get(health))
        .route("/api/auth/signup", post(api_auth::signup_handler))
        .route("/api/auth/login", post(api_auth::login_handler))
        .route("/api/auth/refresh", post(api_auth::refresh_handler))
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
