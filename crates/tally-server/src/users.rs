//! User account store helpers and the refresh-token denylist.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during user store operations.
#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("email already registered: {0}")]
    EmailTaken(String),
    #[error("user not found: {0}")]
    UserNotFound(i64),
}

/// A user account, without credential material.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub job_role: Option<String>,
    pub specialization: Option<String>,
    pub created_at: String,
}

/// A user row including the stored password hash, for login.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Creates a user. The email must be unused.
pub fn create_user(
    conn: &Connection,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, UserStoreError> {
    if find_user_by_email(conn, email)?.is_some() {
        return Err(UserStoreError::EmailTaken(email.to_string()));
    }

    conn.execute(
        "INSERT INTO users (username, email, password_hash) VALUES (?1, ?2, ?3)",
        params![username, email, password_hash],
    )?;
    let id = conn.last_insert_rowid();
    get_user(conn, id)?.ok_or(UserStoreError::UserNotFound(id))
}

/// Retrieves a user by id.
pub fn get_user(conn: &Connection, id: i64) -> Result<Option<User>, UserStoreError> {
    conn.query_row(
        "SELECT id, username, email, job_role, specialization, created_at
         FROM users WHERE id = ?1",
        [id],
        map_row_to_user,
    )
    .optional()
    .map_err(UserStoreError::from)
}

/// Retrieves a user with credentials by email, for login verification.
pub fn find_user_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<UserCredentials>, UserStoreError> {
    conn.query_row(
        "SELECT id, username, email, job_role, specialization, created_at, password_hash
         FROM users WHERE email = ?1",
        [email],
        |row| {
            Ok(UserCredentials {
                user: map_row_to_user(row)?,
                password_hash: row.get(6)?,
            })
        },
    )
    .optional()
    .map_err(UserStoreError::from)
}

/// Sets the user's job role and specialization.
pub fn update_user_role(
    conn: &Connection,
    id: i64,
    job_role: &str,
    specialization: Option<&str>,
) -> Result<User, UserStoreError> {
    let count = conn.execute(
        "UPDATE users SET job_role = ?1, specialization = ?2 WHERE id = ?3",
        params![job_role, specialization, id],
    )?;
    if count == 0 {
        return Err(UserStoreError::UserNotFound(id));
    }
    get_user(conn, id)?.ok_or(UserStoreError::UserNotFound(id))
}

/// Adds a refresh token's `jti` to the denylist. Revoking twice is fine.
pub fn revoke_token(conn: &Connection, jti: &str) -> Result<(), UserStoreError> {
    conn.execute(
        "INSERT OR IGNORE INTO revoked_tokens (jti) VALUES (?1)",
        [jti],
    )?;
    Ok(())
}

/// Whether a refresh token's `jti` has been revoked.
pub fn is_token_revoked(conn: &Connection, jti: &str) -> Result<bool, UserStoreError> {
    let revoked: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM revoked_tokens WHERE jti = ?1",
        [jti],
        |row| row.get(0),
    )?;
    Ok(revoked)
}

fn map_row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        job_role: row.get(3)?,
        specialization: row.get(4)?,
        created_at: row.get(5)?,
    })
}
