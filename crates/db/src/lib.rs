//! SQLite connection pool and migration tooling for shelf.

use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;

const MIGRATIONS_TABLE: &str = "CREATE TABLE IF NOT EXISTS _migrations (\
     module TEXT NOT NULL, \
     id TEXT NOT NULL, \
     applied_at INTEGER NOT NULL DEFAULT (cast(strftime('%s','now') as int)), \
     PRIMARY KEY (module, id))";

/// Errors raised while opening or migrating the database.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("migration '{module}/{id}' failed: {source}")]
    Migration {
        module: String,
        id: String,
        source: sqlx::Error,
    },
}

/// Shared handle to the SQLite pool. Cloning is cheap and every clone talks to
/// the same pool.
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database file at `path`.
    pub async fn open(path: &Path, max_connections: u32) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        tracing::info!(target: "shelf-db", path = %path.display(), "database opened");

        let db = Self { pool };
        db.ensure_migrations_table().await?;
        Ok(db)
    }

    /// Open a private in-memory database. The pool holds a single connection
    /// that never expires, so the data lives as long as the handle does.
    pub async fn open_in_memory() -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.ensure_migrations_table().await?;
        Ok(db)
    }

    async fn ensure_migrations_table(&self) -> Result<(), DbError> {
        sqlx::query(MIGRATIONS_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Apply a migration unless it was applied before.
    ///
    /// The script and its bookkeeping row are committed in one transaction.
    /// Returns `true` when the script ran.
    pub async fn apply_migration(&self, module: &str, id: &str, up: &str) -> Result<bool, DbError> {
        let applied: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM _migrations WHERE module = ? AND id = ?")
                .bind(module)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        if applied.is_some() {
            tracing::debug!(target: "shelf-db", module, id, "migration already applied");
            return Ok(false);
        }

        let wrap = |source: sqlx::Error| DbError::Migration {
            module: module.to_string(),
            id: id.to_string(),
            source,
        };

        let mut tx = self.pool.begin().await.map_err(wrap)?;
        sqlx::raw_sql(up).execute(&mut *tx).await.map_err(wrap)?;
        sqlx::query("INSERT INTO _migrations (module, id) VALUES (?, ?)")
            .bind(module)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(wrap)?;
        tx.commit().await.map_err(wrap)?;

        tracing::info!(target: "shelf-db", module, id, "migration applied");
        Ok(true)
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every connection in the pool. Further queries fail.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!(target: "shelf-db", "database closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREATE_NOTES: &str = "CREATE TABLE notes (id TEXT PRIMARY KEY, body TEXT NOT NULL);";

    #[tokio::test]
    async fn test_open_in_memory() {
        let db = Database::open_in_memory().await.unwrap();
        let row: (i64,) = sqlx::query_as("SELECT 1")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(row.0, 1);
    }

    #[tokio::test]
    async fn test_migration_runs_once() {
        let db = Database::open_in_memory().await.unwrap();

        assert!(db.apply_migration("notes", "001_init", CREATE_NOTES).await.unwrap());
        assert!(!db.apply_migration("notes", "001_init", CREATE_NOTES).await.unwrap());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _migrations")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_failed_migration_is_not_recorded() {
        let db = Database::open_in_memory().await.unwrap();

        let result = db.apply_migration("notes", "001_broken", "CREATE TABLE (").await;
        assert!(matches!(result, Err(DbError::Migration { .. })));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _migrations")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_open_file_based() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("books_test.db");

        let db = Database::open(&db_path, 2).await.unwrap();
        db.apply_migration("notes", "001_init", CREATE_NOTES)
            .await
            .unwrap();
        db.close().await;
        assert!(db_path.exists());

        // Reopening keeps the bookkeeping, so the migration is skipped.
        let db = Database::open(&db_path, 2).await.unwrap();
        assert!(!db.apply_migration("notes", "001_init", CREATE_NOTES).await.unwrap());
    }
}
