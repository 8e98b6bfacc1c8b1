mod common;

use axum::http::StatusCode;
use common::{create_project, send_json, setup_app, signup, ScriptedLlm};
use serde_json::json;

#[tokio::test]
async fn project_crud_round_trip() {
    let (app, _pool, _dir) = setup_app(ScriptedLlm::unused());
    let (_id, access, _) = signup(&app, "kai", "kai@example.com").await;

    let project_id = create_project(&app, &access, "Sprint 12").await;

    let (status, body) = send_json(&app, "GET", "/api/projects", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Sprint 12");

    let (status, body) = send_json(
        &app,
        "GET",
        &format!("/api/projects/{project_id}"),
        Some(&access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], project_id);

    let (status, _) = send_json(
        &app,
        "DELETE",
        &format!("/api/projects/{project_id}"),
        Some(&access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send_json(
        &app,
        "GET",
        &format!("/api/projects/{project_id}"),
        Some(&access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn task_create_defaults_to_first_project_and_todo() {
    let (app, _pool, _dir) = setup_app(ScriptedLlm::unused());
    let (_id, access, _) = signup(&app, "kai", "kai@example.com").await;
    let project_id = create_project(&app, &access, "Sprint 12").await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/tasks",
        Some(&access),
        Some(json!({"title": "login page", "description": "build the form"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["project_id"], project_id);
    assert_eq!(body["status"], "TODO");
}

#[tokio::test]
async fn task_create_without_any_project_fails() {
    let (app, _pool, _dir) = setup_app(ScriptedLlm::unused());
    let (_id, access, _) = signup(&app, "kai", "kai@example.com").await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/tasks",
        Some(&access),
        Some(json!({"title": "login page"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "no active project for user");
}

#[tokio::test]
async fn task_status_strings_are_validated() {
    let (app, _pool, _dir) = setup_app(ScriptedLlm::unused());
    let (_id, access, _) = signup(&app, "kai", "kai@example.com").await;
    create_project(&app, &access, "Sprint 12").await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/tasks",
        Some(&access),
        Some(json!({"title": "login page", "status": "DONE"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unknown task status: DONE");

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/tasks",
        Some(&access),
        Some(json!({"title": "login page", "status": "IN_PROGRESS"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "IN_PROGRESS");
}

#[tokio::test]
async fn duplicate_task_title_conflicts() {
    let (app, _pool, _dir) = setup_app(ScriptedLlm::unused());
    let (_id, access, _) = signup(&app, "kai", "kai@example.com").await;
    create_project(&app, &access, "Sprint 12").await;

    let payload = json!({"title": "login page"});
    let (status, _) =
        send_json(&app, "POST", "/api/tasks", Some(&access), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send_json(&app, "POST", "/api/tasks", Some(&access), Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn task_update_and_delete() {
    let (app, _pool, _dir) = setup_app(ScriptedLlm::unused());
    let (_id, access, _) = signup(&app, "kai", "kai@example.com").await;
    create_project(&app, &access, "Sprint 12").await;

    let (_, created) = send_json(
        &app,
        "POST",
        "/api/tasks",
        Some(&access),
        Some(json!({"title": "login page"})),
    )
    .await;
    let task_id = created["id"].as_i64().unwrap();

    let (status, body) = send_json(
        &app,
        "PUT",
        &format!("/api/tasks/{task_id}"),
        Some(&access),
        Some(json!({"status": "COMPLETED", "due_date": "2025-04-01"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "COMPLETED");
    assert_eq!(body["due_date"], "2025-04-01");
    assert_eq!(body["title"], "login page");

    let (status, _) = send_json(
        &app,
        "DELETE",
        &format!("/api/tasks/{task_id}"),
        Some(&access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send_json(&app, "GET", "/api/tasks", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn tasks_are_scoped_to_their_owner() {
    let (app, _pool, _dir) = setup_app(ScriptedLlm::unused());
    let (_kai, kai_access, _) = signup(&app, "kai", "kai@example.com").await;
    let (_rae, rae_access, _) = signup(&app, "rae", "rae@example.com").await;
    create_project(&app, &kai_access, "Kai's project").await;
    create_project(&app, &rae_access, "Rae's project").await;

    let (_, created) = send_json(
        &app,
        "POST",
        "/api/tasks",
        Some(&kai_access),
        Some(json!({"title": "login page"})),
    )
    .await;
    let task_id = created["id"].as_i64().unwrap();

    // Rae cannot see or touch Kai's task.
    let (status, body) = send_json(&app, "GET", "/api/tasks", Some(&rae_access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = send_json(
        &app,
        "DELETE",
        &format!("/api/tasks/{task_id}"),
        Some(&rae_access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
