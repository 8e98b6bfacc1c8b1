//! Authentication API handlers: signup, login, token refresh, logout,
//! and role selection.

use crate::auth::{self, TokenKind, TokenPair};
use crate::middleware::CurrentUser;
use crate::users::{self, User, UserStoreError};
use crate::{api::ApiError, AppState};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: User,
    pub tokens: TokenPair,
}

/// Handler for `POST /api/auth/signup`.
pub async fn signup_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.username.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
    {
        return Err(ApiError::BadRequest("all fields are required".to_string()));
    }

    let st = state.clone();
    let user = tokio::task::spawn_blocking(move || {
        let conn = st
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;

        let password_hash = auth::hash_password(&payload.password);
        users::create_user(&conn, payload.username.trim(), payload.email.trim(), &password_hash)
            .map_err(|e| match e {
                UserStoreError::EmailTaken(_) => {
                    ApiError::BadRequest("email already registered".to_string())
                }
                other => ApiError::InternalServerError(other.to_string()),
            })
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    let tokens = auth::issue_token_pair(&state.auth, user.id)
        .map_err(|e| ApiError::InternalServerError(format!("token issuance failed: {}", e)))?;

    tracing::info!(user_id = user.id, "user signed up");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully".to_string(),
            user,
            tokens,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Handler for `POST /api/auth/login`.
pub async fn login_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let st = state.clone();
    let user = tokio::task::spawn_blocking(move || {
        let conn = st
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;

        let credentials = users::find_user_by_email(&conn, payload.email.trim())
            .map_err(|e| ApiError::InternalServerError(e.to_string()))?
            .ok_or_else(|| ApiError::Unauthorized("invalid credentials".to_string()))?;

        if !auth::verify_password(&payload.password, &credentials.password_hash) {
            return Err(ApiError::Unauthorized("invalid credentials".to_string()));
        }

        Ok(credentials.user)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    let tokens = auth::issue_token_pair(&state.auth, user.id)
        .map_err(|e| ApiError::InternalServerError(format!("token issuance failed: {}", e)))?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        user,
        tokens,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// Handler for `POST /api/auth/refresh`.
///
/// Exchanges a valid, non-revoked refresh token for a new access token.
pub async fn refresh_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let claims = auth::verify_token(&state.auth, &payload.refresh_token, TokenKind::Refresh)
        .map_err(|_| ApiError::Unauthorized("invalid refresh token".to_string()))?;

    let st = state.clone();
    let user_id = claims.sub;
    let jti = claims.jti.clone();
    tokio::task::spawn_blocking(move || {
        let conn = st
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;

        let revoked = users::is_token_revoked(&conn, &jti)
            .map_err(|e| ApiError::InternalServerError(e.to_string()))?;
        if revoked {
            return Err(ApiError::Unauthorized("refresh token revoked".to_string()));
        }

        users::get_user(&conn, user_id)
            .map_err(|e| ApiError::InternalServerError(e.to_string()))?
            .ok_or_else(|| ApiError::Unauthorized("unknown user".to_string()))?;
        Ok(())
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    let access = auth::issue_access_token(&state.auth, claims.sub)
        .map_err(|e| ApiError::InternalServerError(format!("token issuance failed: {}", e)))?;

    Ok(Json(RefreshResponse { access }))
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

/// Handler for `POST /api/auth/logout`.
///
/// Revokes the presented refresh token. The access token simply expires.
pub async fn logout_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<LogoutRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let claims = auth::verify_token(&state.auth, &payload.refresh_token, TokenKind::Refresh)
        .map_err(|_| ApiError::BadRequest("invalid refresh token".to_string()))?;

    let st = state.clone();
    tokio::task::spawn_blocking(move || {
        let conn = st
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;

        users::revoke_token(&conn, &claims.jti)
            .map_err(|e| ApiError::InternalServerError(e.to_string()))
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    tracing::info!(user_id = user.id, "user logged out");

    Ok(Json(serde_json::json!({"message": "Logout successful"})))
}

#[derive(Debug, Deserialize)]
pub struct SelectRoleRequest {
    pub job_role: String,
    pub specialization: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SelectRoleResponse {
    pub message: String,
    pub user: User,
}

/// Handler for `POST /api/auth/select-role`.
pub async fn select_role_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<SelectRoleRequest>,
) -> Result<Json<SelectRoleResponse>, ApiError> {
    if payload.job_role.trim().is_empty() {
        return Err(ApiError::BadRequest("job role is required".to_string()));
    }

    let st = state.clone();
    let user_id = user.id;
    let updated = tokio::task::spawn_blocking(move || {
        let conn = st
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;

        users::update_user_role(
            &conn,
            user_id,
            payload.job_role.trim(),
            payload.specialization.as_deref(),
        )
        .map_err(|e| match e {
            UserStoreError::UserNotFound(id) => ApiError::NotFound(format!("user not found: {id}")),
            other => ApiError::InternalServerError(other.to_string()),
        })
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok(Json(SelectRoleResponse {
        message: "Profile updated successfully".to_string(),
        user: updated,
    }))
}
