//! SQLite storage layer.
//!
//! Plain repository functions over a shared [`SqlitePool`]; queries are
//! runtime-checked (`query_as` + `FromRow`), migrations are embedded in the
//! binary.

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

pub mod activities;
pub mod conversations;
pub mod notifications;
pub mod products;
pub mod sales;
pub mod teams;
pub mod users;

/// Opens the database pool, creating the file when it does not exist.
///
/// # Errors
///
/// Returns an error if the URL is malformed or the database cannot be
/// opened.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// Runs the embedded migrations.
///
/// # Errors
///
/// Returns an error if a migration fails to apply.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!().run(pool).await
}

/// True when the error is a UNIQUE constraint violation, so callers can
/// surface a 409 instead of a 500.
#[must_use]
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation)
        }
        _ => false,
    }
}
