// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database handle wrapping a single `tokio-rusqlite` connection.
//!
//! All reads and writes go through [`Database::call`], which serializes
//! closures onto one background thread and bounds each operation with the
//! configured timeout.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use tokio_rusqlite::Connection;
use tracing::debug;

use comanda_core::ComandaError;

use crate::migrations;

/// Handle to the SQLite database.
///
/// Wraps a single `tokio_rusqlite::Connection`; all closure calls are
/// serialized on its background thread, which eliminates SQLITE_BUSY errors
/// under concurrent access.
pub struct Database {
    conn: Connection,
    op_timeout: Duration,
}

impl Database {
    /// Open (or create) the database at `path`, apply pragmas, and run all
    /// pending migrations.
    pub async fn open(
        path: &str,
        wal_mode: bool,
        op_timeout: Duration,
    ) -> Result<Self, ComandaError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| ComandaError::Storage {
                    source: Box::new(e),
                })?;
            }
        }

        let conn = Connection::open(path)
            .await
            .map_err(|e| ComandaError::Storage { source: Box::new(e) })?;

        let journal_mode = if wal_mode { "WAL" } else { "DELETE" };
        let pragmas = format!(
            "PRAGMA journal_mode = {journal_mode};
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;"
        );
        conn.call(move |c| -> Result<(), rusqlite::Error> {
            c.execute_batch(&pragmas)?;
            migrations::run_migrations(c)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened and migrated");
        Ok(Self { conn, op_timeout })
    }

    /// Run a closure against the connection on the writer thread, bounded
    /// by the configured operation timeout.
    ///
    /// A timed-out closure is not cancelled: it may still complete on the
    /// writer thread after this returns `Timeout`. Callers must treat the
    /// operation as failed and rely on idempotent retries (order commits
    /// are covered by duplicate suppression).
    pub async fn call<F, T>(&self, f: F) -> Result<T, ComandaError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<T, rusqlite::Error> + Send + 'static,
        T: Send + 'static,
    {
        match tokio::time::timeout(self.op_timeout, self.conn.call(f)).await {
            Ok(result) => result.map_err(map_tr_err),
            Err(_) => Err(ComandaError::Timeout {
                duration: self.op_timeout,
            }),
        }
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(&self) -> Result<(), ComandaError> {
        self.call(|conn| {
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
            Ok(())
        })
        .await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Map a tokio-rusqlite error into the crate error type.
pub fn map_tr_err<E>(err: tokio_rusqlite::Error<E>) -> ComandaError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ComandaError::Storage {
        source: Box::new(err),
    }
}

/// Format a timestamp the way every table stores it: RFC 3339 UTC with
/// millisecond precision and a `Z` suffix, so TEXT comparison matches
/// chronological order.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_file_and_runs_migrations() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("open.db");
        let db = Database::open(
            db_path.to_str().unwrap(),
            true,
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert!(db_path.exists(), "database file should be created");

        // The migrated schema should contain the users table.
        let count: i64 = db
            .call(|conn| {
                let n = conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='users'",
                    [],
                    |row| row.get(0),
                )?;
                Ok(n)
            })
            .await
            .unwrap();
        assert_eq!(count, 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_is_idempotent_across_reopens() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reopen.db");
        let path = db_path.to_str().unwrap();

        let db = Database::open(path, true, Duration::from_secs(5)).await.unwrap();
        db.close().await.unwrap();
        drop(db);

        // Refinery tracks applied migrations; a second open must not fail.
        let db = Database::open(path, true, Duration::from_secs(5)).await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn slow_operation_surfaces_timeout() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("slow.db");
        let db = Database::open(db_path.to_str().unwrap(), true, Duration::from_millis(50))
            .await
            .unwrap();

        let result = db
            .call(|_conn| {
                std::thread::sleep(Duration::from_millis(500));
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(ComandaError::Timeout { .. })));
    }

    #[test]
    fn timestamps_compare_lexicographically() {
        let earlier = timestamp("2026-01-01T00:00:01Z".parse().unwrap());
        let later = timestamp("2026-01-01T12:30:00Z".parse().unwrap());
        assert!(earlier < later);
        assert!(earlier.ends_with('Z'));
    }
}
