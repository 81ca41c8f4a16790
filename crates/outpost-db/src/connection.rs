//! `SQLite` connection pool setup.
//!
//! File databases use WAL journaling and a small pool. `:memory:` gets a
//! single long-lived connection, since every new in-memory connection
//! would otherwise see its own empty database.

use crate::error::{DatabaseError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Path that selects an in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Open a connection pool for the database at `path`.
///
/// Missing parent directories and the file itself are created.
///
/// # Errors
/// Returns `DatabaseError::Open` if the options are invalid or the first
/// connection cannot be established.
pub async fn connect(path: impl AsRef<Path>) -> Result<Pool<Sqlite>> {
    let path = path.as_ref();

    if path.as_os_str() == MEMORY_PATH {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| DatabaseError::Open(format!("invalid in-memory options: {e}")))?;
        return SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::Open(format!("in-memory database: {e}")));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(ACQUIRE_TIMEOUT);

    tracing::debug!(path = %path.display(), "Opening database");

    SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await
        .map_err(|e| DatabaseError::Open(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_in_memory() {
        let pool = connect(MEMORY_PATH).await.expect("connect");
        let one: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("query");
        assert_eq!(one, 1);
    }

    #[tokio::test]
    async fn test_in_memory_state_is_shared() {
        let pool = connect(MEMORY_PATH).await.expect("connect");
        sqlx::query("CREATE TABLE probe (id INTEGER)")
            .execute(&pool)
            .await
            .expect("create");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM probe")
            .fetch_one(&pool)
            .await
            .expect("query on second acquire");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_connect_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("outlets.db");

        let pool = connect(&path).await.expect("connect");
        pool.close().await;

        assert!(path.exists());
    }
}
