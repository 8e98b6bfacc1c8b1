//! Presentation store helpers.
//!
//! A presentation's `data` is an opaque JSON document (slides plus
//! talking points) produced by the language model and edited by the
//! client; the server validates shape only at generation time.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during presentation store operations.
#[derive(Debug, Error)]
pub enum PresentationStoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("presentation not found: {0}")]
    NotFound(i64),
    #[error("presentation data is not valid JSON: {0}")]
    Data(#[from] serde_json::Error),
}

/// A stored presentation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Presentation {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Slide outline: `{"slides": [...], "talking_points": [...]}`.
    pub data: Value,
    pub created_at: String,
}

/// Creates a presentation and returns the stored row.
pub fn create_presentation(
    conn: &Connection,
    user_id: i64,
    title: &str,
    description: Option<&str>,
    data: &Value,
) -> Result<Presentation, PresentationStoreError> {
    conn.execute(
        "INSERT INTO presentations (user_id, title, description, data_json)
         VALUES (?1, ?2, ?3, ?4)",
        params![user_id, title, description, data.to_string()],
    )?;
    let id = conn.last_insert_rowid();
    get_presentation(conn, id)?.ok_or(PresentationStoreError::NotFound(id))
}

/// Retrieves a presentation by id, regardless of owner. Handlers enforce
/// ownership so that a foreign id yields 403, not 404.
pub fn get_presentation(
    conn: &Connection,
    id: i64,
) -> Result<Option<Presentation>, PresentationStoreError> {
    conn.query_row(
        "SELECT id, user_id, title, description, data_json, created_at
         FROM presentations WHERE id = ?1",
        [id],
        map_row_to_presentation,
    )
    .optional()?
    .transpose()
}

/// Lists all of the user's presentations, newest first.
pub fn list_presentations(
    conn: &Connection,
    user_id: i64,
) -> Result<Vec<Presentation>, PresentationStoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, title, description, data_json, created_at
         FROM presentations WHERE user_id = ?1 ORDER BY id DESC",
    )?;
    let rows = stmt.query_map([user_id], map_row_to_presentation)?;
    let mut presentations = Vec::new();
    for row in rows {
        presentations.push(row??);
    }
    Ok(presentations)
}

/// Updates title and/or description. `None` fields are untouched.
pub fn update_presentation(
    conn: &Connection,
    id: i64,
    title: Option<&str>,
    description: Option<&str>,
) -> Result<(), PresentationStoreError> {
    let count = conn.execute(
        "UPDATE presentations
         SET title = COALESCE(?1, title),
             description = COALESCE(?2, description)
         WHERE id = ?3",
        params![title, description, id],
    )?;
    if count == 0 {
        return Err(PresentationStoreError::NotFound(id));
    }
    Ok(())
}

/// Deletes a presentation.
pub fn delete_presentation(conn: &Connection, id: i64) -> Result<(), PresentationStoreError> {
    let count = conn.execute("DELETE FROM presentations WHERE id = ?1", [id])?;
    if count == 0 {
        return Err(PresentationStoreError::NotFound(id));
    }
    Ok(())
}

fn map_row_to_presentation(
    row: &Row,
) -> rusqlite::Result<Result<Presentation, PresentationStoreError>> {
    let data_json: String = row.get(4)?;
    let data = match serde_json::from_str(&data_json) {
        Ok(value) => value,
        Err(e) => return Ok(Err(PresentationStoreError::Data(e))),
    };

    Ok(Ok(Presentation {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        data,
        created_at: row.get(5)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tally_db::run_migrations;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute(
            "INSERT INTO users (username, email, password_hash) VALUES ('kai', 'kai@example.com', 'x')",
            [],
        )
        .unwrap();
        conn
    }

    #[test]
    fn create_and_list_round_trip() {
        let conn = test_conn();
        let data = json!({
            "slides": [{"title": "Intro", "content": ["a", "b"]}],
            "talking_points": ["start strong"]
        });

        let stored = create_presentation(&conn, 1, "Q2 Review", None, &data).unwrap();
        assert_eq!(stored.data, data);

        let listed = list_presentations(&conn, 1).unwrap();
        assert_eq!(listed, vec![stored]);
    }

    #[test]
    fn update_touches_only_named_fields() {
        let conn = test_conn();
        let stored =
            create_presentation(&conn, 1, "Q2 Review", Some("draft"), &json!({})).unwrap();

        update_presentation(&conn, stored.id, Some("Q2 Final"), None).unwrap();

        let updated = get_presentation(&conn, stored.id).unwrap().unwrap();
        assert_eq!(updated.title, "Q2 Final");
        assert_eq!(updated.description.as_deref(), Some("draft"));
    }

    #[test]
    fn delete_missing_reports_not_found() {
        let conn = test_conn();
        assert!(matches!(
            delete_presentation(&conn, 9),
            Err(PresentationStoreError::NotFound(9))
        ));
    }
}
