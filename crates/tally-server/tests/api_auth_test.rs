mod common;

use axum::http::StatusCode;
use common::{send_json, setup_app, signup, ScriptedLlm};
use serde_json::json;

#[tokio::test]
async fn signup_returns_user_and_token_pair() {
    let (app, _pool, _dir) = setup_app(ScriptedLlm::unused());

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({
            "username": "kai",
            "email": "kai@example.com",
            "password": "testpass123",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User created successfully");
    assert_eq!(body["user"]["email"], "kai@example.com");
    assert!(body["tokens"]["access"].as_str().unwrap().contains('.'));
    assert!(body["tokens"]["refresh"].as_str().unwrap().contains('.'));
}

#[tokio::test]
async fn signup_rejects_duplicate_email_and_blank_fields() {
    let (app, _pool, _dir) = setup_app(ScriptedLlm::unused());
    signup(&app, "kai", "kai@example.com").await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({
            "username": "other",
            "email": "kai@example.com",
            "password": "testpass123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "email already registered");

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({"username": "", "email": "x@example.com", "password": "p"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_verifies_credentials() {
    let (app, _pool, _dir) = setup_app(ScriptedLlm::unused());
    signup(&app, "kai", "kai@example.com").await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "kai@example.com", "password": "testpass123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert!(body["tokens"]["access"].is_string());

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "kai@example.com", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "nobody@example.com", "password": "testpass123"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_issues_a_new_access_token() {
    let (app, _pool, _dir) = setup_app(ScriptedLlm::unused());
    let (_id, _access, refresh) = signup(&app, "kai", "kai@example.com").await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({"refresh_token": refresh})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The new access token works against a protected route.
    let access = body["access"].as_str().unwrap();
    let (status, _) = send_json(&app, "GET", "/api/tasks", Some(access), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn access_token_cannot_be_used_as_refresh_token() {
    let (app, _pool, _dir) = setup_app(ScriptedLlm::unused());
    let (_id, access, _refresh) = signup(&app, "kai", "kai@example.com").await;

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({"refresh_token": access})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_revokes_the_refresh_token() {
    let (app, _pool, _dir) = setup_app(ScriptedLlm::unused());
    let (_id, access, refresh) = signup(&app, "kai", "kai@example.com").await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/auth/logout",
        Some(&access),
        Some(json!({"refresh_token": refresh})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logout successful");

    // The revoked refresh token no longer mints access tokens.
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({"refresh_token": refresh})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_a_valid_bearer_token() {
    let (app, _pool, _dir) = setup_app(ScriptedLlm::unused());

    let (status, _) = send_json(&app, "GET", "/api/tasks", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_json(&app, "GET", "/api/tasks", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn select_role_updates_the_profile() {
    let (app, _pool, _dir) = setup_app(ScriptedLlm::unused());
    let (_id, access, _refresh) = signup(&app, "kai", "kai@example.com").await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/auth/select-role",
        Some(&access),
        Some(json!({"job_role": "engineer", "specialization": "backend"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["job_role"], "engineer");
    assert_eq!(body["user"]["specialization"], "backend");

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/auth/select-role",
        Some(&access),
        Some(json!({"job_role": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
