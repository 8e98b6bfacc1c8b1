//! Project and task persistence for the Tally platform.
//!
//! Implements project/task CRUD over SQLite and the reconciliation of
//! classifier output into the task table.
//!
//! Tasks are matched by title, not surrogate id: `(user, project, title)`
//! is the reconciliation identity, enforced by a unique index. The store
//! helpers here are plain functions over a `rusqlite::Connection`; request
//! handlers call them from the blocking pool.

mod reconcile;

pub use reconcile::{reconcile_tasks, ReconcileError, ReconcileSummary};

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tally_types::TaskStatus;
use thiserror::Error;

/// Errors that can occur during project/task store operations.
#[derive(Debug, Error)]
pub enum TaskStoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("project not found: {0}")]
    ProjectNotFound(i64),
    #[error("task not found: {0}")]
    TaskNotFound(i64),
    #[error("unknown task status: {0}")]
    UnknownStatus(String),
}

/// A project owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    /// Internal database ID.
    pub id: i64,
    /// Owning user.
    pub user_id: i64,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Creation timestamp (ISO 8601).
    pub created_at: String,
}

/// A task row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Internal database ID.
    pub id: i64,
    /// Owning user.
    pub user_id: i64,
    /// Project the task belongs to.
    pub project_id: i64,
    /// Title; the reconciliation matching key within (user, project).
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Lifecycle status.
    pub status: TaskStatus,
    /// Optional due date (ISO 8601 date).
    pub due_date: Option<String>,
    /// Creation timestamp (ISO 8601).
    pub created_at: String,
    /// Last-update timestamp (ISO 8601).
    pub updated_at: String,
}

/// Parameters for creating a new task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskParams {
    pub user_id: i64,
    pub project_id: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub due_date: Option<String>,
}

/// Parameters for updating an existing task. `None` fields are untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskParams {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<Option<String>>,
}

/// Creates a project and returns the stored row.
pub fn create_project(
    conn: &Connection,
    user_id: i64,
    name: &str,
    description: Option<&str>,
) -> Result<Project, TaskStoreError> {
    conn.execute(
        "INSERT INTO projects (user_id, name, description) VALUES (?1, ?2, ?3)",
        params![user_id, name, description],
    )?;
    let id = conn.last_insert_rowid();
    get_project(conn, user_id, id)
}

/// Retrieves one of the user's projects by id.
pub fn get_project(conn: &Connection, user_id: i64, id: i64) -> Result<Project, TaskStoreError> {
    conn.query_row(
        "SELECT id, user_id, name, description, created_at
         FROM projects WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
        map_row_to_project,
    )
    .optional()?
    .ok_or(TaskStoreError::ProjectNotFound(id))
}

/// Lists all of the user's projects, oldest first.
pub fn list_projects(conn: &Connection, user_id: i64) -> Result<Vec<Project>, TaskStoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, description, created_at
         FROM projects WHERE user_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([user_id], map_row_to_project)?;
    let mut projects = Vec::new();
    for row in rows {
        projects.push(row?);
    }
    Ok(projects)
}

/// The user's first project, if any.
///
/// The reconciliation flow assumes one project per user and takes the
/// oldest when several exist.
pub fn find_first_project(
    conn: &Connection,
    user_id: i64,
) -> Result<Option<Project>, TaskStoreError> {
    conn.query_row(
        "SELECT id, user_id, name, description, created_at
         FROM projects WHERE user_id = ?1 ORDER BY id ASC LIMIT 1",
        [user_id],
        map_row_to_project,
    )
    .optional()
    .map_err(TaskStoreError::from)
}

/// Deletes one of the user's projects (tasks cascade).
pub fn delete_project(conn: &Connection, user_id: i64, id: i64) -> Result<(), TaskStoreError> {
    let count = conn.execute(
        "DELETE FROM projects WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    if count == 0 {
        return Err(TaskStoreError::ProjectNotFound(id));
    }
    Ok(())
}

/// Creates a task and returns the stored row.
pub fn create_task(conn: &Connection, task: &CreateTaskParams) -> Result<Task, TaskStoreError> {
    conn.execute(
        "INSERT INTO tasks (user_id, project_id, title, description, status, due_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            task.user_id,
            task.project_id,
            task.title,
            task.description,
            task.status.as_str(),
            task.due_date,
        ],
    )?;
    let id = conn.last_insert_rowid();
    get_task(conn, task.user_id, id)
}

/// Retrieves one of the user's tasks by id.
pub fn get_task(conn: &Connection, user_id: i64, id: i64) -> Result<Task, TaskStoreError> {
    conn.query_row(
        "SELECT id, user_id, project_id, title, description, status, due_date,
                created_at, updated_at
         FROM tasks WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
        map_row_to_task,
    )
    .optional()?
    .ok_or(TaskStoreError::TaskNotFound(id))?
}

/// Finds a task by its reconciliation identity. Title matching is exact
/// and case-sensitive.
pub fn find_task_by_title(
    conn: &Connection,
    user_id: i64,
    project_id: i64,
    title: &str,
) -> Result<Option<Task>, TaskStoreError> {
    conn.query_row(
        "SELECT id, user_id, project_id, title, description, status, due_date,
                created_at, updated_at
         FROM tasks WHERE user_id = ?1 AND project_id = ?2 AND title = ?3",
        params![user_id, project_id, title],
        map_row_to_task,
    )
    .optional()?
    .transpose()
}

/// Lists all of the user's tasks, oldest first.
pub fn list_tasks(conn: &Connection, user_id: i64) -> Result<Vec<Task>, TaskStoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, project_id, title, description, status, due_date,
                created_at, updated_at
         FROM tasks WHERE user_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([user_id], map_row_to_task)?;
    let mut tasks = Vec::new();
    for row in rows {
        tasks.push(row??);
    }
    Ok(tasks)
}

/// Sets a task's status and bumps `updated_at`.
pub fn update_task_status(
    conn: &Connection,
    task_id: i64,
    status: TaskStatus,
) -> Result<(), TaskStoreError> {
    let count = conn.execute(
        "UPDATE tasks SET status = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![status.as_str(), task_id],
    )?;
    if count == 0 {
        return Err(TaskStoreError::TaskNotFound(task_id));
    }
    Ok(())
}

/// Updates a task using a single atomic UPDATE statement.
///
/// Only fields that are `Some` in `updates` are modified. This avoids the
/// read-modify-write race of fetching, mutating in memory, and writing
/// back.
pub fn update_task(
    conn: &Connection,
    user_id: i64,
    task_id: i64,
    updates: &UpdateTaskParams,
) -> Result<(), TaskStoreError> {
    let mut set_parts: Vec<String> = Vec::new();
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    let mut idx = 1usize;

    if let Some(title) = &updates.title {
        set_parts.push(format!("title = ?{}", idx));
        values.push(Box::new(title.clone()));
        idx += 1;
    }
    if let Some(description) = &updates.description {
        set_parts.push(format!("description = ?{}", idx));
        values.push(Box::new(description.clone()));
        idx += 1;
    }
    if let Some(status) = &updates.status {
        set_parts.push(format!("status = ?{}", idx));
        values.push(Box::new(status.as_str().to_string()));
        idx += 1;
    }
    if let Some(due_date) = &updates.due_date {
        set_parts.push(format!("due_date = ?{}", idx));
        values.push(Box::new(due_date.clone()));
        idx += 1;
    }

    if set_parts.is_empty() {
        // Nothing to change; still report a missing task.
        let _ = get_task(conn, user_id, task_id)?;
        return Ok(());
    }

    set_parts.push("updated_at = datetime('now')".to_string());

    let sql = format!(
        "UPDATE tasks SET {} WHERE id = ?{} AND user_id = ?{}",
        set_parts.join(", "),
        idx,
        idx + 1
    );
    values.push(Box::new(task_id));
    values.push(Box::new(user_id));

    let params: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let count = conn.execute(&sql, params.as_slice())?;
    if count == 0 {
        return Err(TaskStoreError::TaskNotFound(task_id));
    }
    Ok(())
}

/// Deletes one of the user's tasks.
pub fn delete_task(conn: &Connection, user_id: i64, task_id: i64) -> Result<(), TaskStoreError> {
    let count = conn.execute(
        "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2",
        params![task_id, user_id],
    )?;
    if count == 0 {
        return Err(TaskStoreError::TaskNotFound(task_id));
    }
    Ok(())
}

fn map_row_to_project(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Maps a task row; the status column is validated outside rusqlite's
/// error type, hence the nested result.
fn map_row_to_task(row: &Row) -> rusqlite::Result<Result<Task, TaskStoreError>> {
    let status_str: String = row.get(5)?;
    let status = match TaskStatus::parse(&status_str) {
        Some(status) => status,
        None => return Ok(Err(TaskStoreError::UnknownStatus(status_str))),
    };

    Ok(Ok(Task {
        id: row.get(0)?,
        user_id: row.get(1)?,
        project_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        status,
        due_date: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    }))
}
