//! Request authentication middleware.

use crate::auth::{self, TokenKind};
use crate::users::{self, User};
use crate::AppState;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Wrapper for the authenticated [`User`], stored in request extensions.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Middleware that authenticates requests via `Authorization: Bearer`.
///
/// The bearer token must be a valid, unexpired access token; the user it
/// names must still exist. On success the loaded [`User`] is injected into
/// request extensions as [`CurrentUser`].
pub async fn auth_middleware(mut req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|val| val.to_str().ok())
        .and_then(|val| val.strip_prefix("Bearer "))
        .map(str::to_string)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?
        .clone();

    let claims = auth::verify_token(&state.auth, &token, TokenKind::Access)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    // Any lookup failure (including "not found") reads as unauthorized.
    let user = tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        users::get_user(&conn, claims.sub)
            .map_err(|_| StatusCode::UNAUTHORIZED)?
            .ok_or(StatusCode::UNAUTHORIZED)
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)??;

    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}
