//! Reconciliation of classifier output into the task table.
//!
//! Merges a freshly extracted task delta into persistent task state
//! without creating duplicates and without reverting completed work.
//! Every per-task operation is independent: one failure is logged and
//! skipped, the rest of the batch proceeds.

use crate::{
    create_task, find_first_project, find_task_by_title, update_task_status, CreateTaskParams,
    TaskStoreError,
};
use rusqlite::Connection;
use tally_types::{NewTask, TaskStatus};
use thiserror::Error;

/// Errors that abort a reconciliation call outright.
///
/// Only structural failures propagate; per-task write failures are
/// absorbed into the [`ReconcileSummary`].
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The owner has no project to reconcile against. Surfaced to the
    /// caller rather than silently ignored.
    #[error("no active project for user {0}")]
    NoActiveProject(i64),

    /// The project lookup itself failed.
    #[error("task store error: {0}")]
    Store(#[from] TaskStoreError),
}

/// Counts of what a reconciliation pass did. Logged by callers; the HTTP
/// response shape is unaffected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Existing tasks transitioned to COMPLETED.
    pub marked_completed: usize,
    /// Completed tasks that had never been tracked and were created
    /// directly in COMPLETED state.
    pub created_completed: usize,
    /// New tasks created in TODO state.
    pub created_new: usize,
    /// Input items that required no change (already completed, or a new
    /// task whose title already exists).
    pub unchanged: usize,
    /// Per-task operations that failed and were skipped.
    pub failed: usize,
}

/// Applies an extraction result to the owner's task list.
///
/// Resolves the owner's first project (error if none), then:
/// - each completed title marks the matching task COMPLETED, or creates
///   it directly COMPLETED when it was never tracked;
/// - each new task is created TODO unless a task with that title already
///   exists.
///
/// Idempotent: applying the same delta twice yields the same final task
/// state. Titles are processed in input order, but order does not affect
/// the outcome — operations are keyed by title.
pub fn reconcile_tasks(
    conn: &Connection,
    user_id: i64,
    completed_titles: &[String],
    new_tasks: &[NewTask],
) -> Result<ReconcileSummary, ReconcileError> {
    let project = find_first_project(conn, user_id)?
        .ok_or(ReconcileError::NoActiveProject(user_id))?;

    let mut summary = ReconcileSummary::default();

    for title in completed_titles {
        match apply_completed(conn, user_id, project.id, title) {
            Ok(Applied::Marked) => summary.marked_completed += 1,
            Ok(Applied::Created) => summary.created_completed += 1,
            Ok(Applied::Unchanged) => summary.unchanged += 1,
            Err(e) => {
                tracing::warn!(title = %title, error = %e, "failed to reconcile completed task, skipping");
                summary.failed += 1;
            }
        }
    }

    for task in new_tasks {
        match apply_new(conn, user_id, project.id, task) {
            Ok(Applied::Created) => summary.created_new += 1,
            Ok(_) => summary.unchanged += 1,
            Err(e) => {
                tracing::warn!(title = %task.title, error = %e, "failed to create new task, skipping");
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        user_id,
        project_id = project.id,
        marked_completed = summary.marked_completed,
        created_completed = summary.created_completed,
        created_new = summary.created_new,
        unchanged = summary.unchanged,
        failed = summary.failed,
        "reconciled transcript extraction"
    );

    Ok(summary)
}

enum Applied {
    Marked,
    Created,
    Unchanged,
}

fn apply_completed(
    conn: &Connection,
    user_id: i64,
    project_id: i64,
    title: &str,
) -> Result<Applied, TaskStoreError> {
    match find_task_by_title(conn, user_id, project_id, title)? {
        Some(task) if task.status == TaskStatus::Completed => Ok(Applied::Unchanged),
        Some(task) => {
            update_task_status(conn, task.id, TaskStatus::Completed)?;
            Ok(Applied::Marked)
        }
        None => {
            // Completed between sessions without ever being tracked:
            // record it directly in its final state.
            create_task(
                conn,
                &CreateTaskParams {
                    user_id,
                    project_id,
                    title: title.to_string(),
                    description: String::new(),
                    status: TaskStatus::Completed,
                    due_date: None,
                },
            )?;
            Ok(Applied::Created)
        }
    }
}

fn apply_new(
    conn: &Connection,
    user_id: i64,
    project_id: i64,
    task: &NewTask,
) -> Result<Applied, TaskStoreError> {
    if find_task_by_title(conn, user_id, project_id, &task.title)?.is_some() {
        return Ok(Applied::Unchanged);
    }

    create_task(
        conn,
        &CreateTaskParams {
            user_id,
            project_id,
            title: task.title.clone(),
            description: task.description.clone(),
            status: TaskStatus::Todo,
            due_date: None,
        },
    )?;
    Ok(Applied::Created)
}
