//! Database layer for the Tally platform.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! and embedded SQL migrations. Every table in Tally is created through
//! versioned migrations managed by this crate.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: a single-process backend needs no external
//!   database server. WAL allows concurrent readers with a single writer,
//!   which matches the Tally access pattern (many reads, short writes).
//! - **`r2d2` connection pool**: bounded connection reuse without manual
//!   lifetime management; request handlers check a connection out on the
//!   blocking pool.
//! - **Embedded migrations**: SQL files are compiled into the binary via
//!   `include_str!` so the schema ships with the server and cannot drift
//!   from the code that depends on it.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbSettings, PoolError};
