//! Durable result store over a single SQLite file.
//!
//! Deduplication correctness lives here: the `signature` column carries a
//! UNIQUE constraint and inserts go through `ON CONFLICT DO NOTHING`, so
//! overlapping cron runs can race freely without ever producing two rows
//! for the same draw. No check-then-act anywhere.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS results (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    source      TEXT NOT NULL,
    draw_date   TEXT NOT NULL,
    draw_time   TEXT,
    result_text TEXT NOT NULL,
    signature   TEXT NOT NULL UNIQUE,
    created_at  BIGINT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_results_draw_date ON results(draw_date);
CREATE INDEX IF NOT EXISTS idx_results_created_at ON results(created_at);
"#;

/// A persisted draw result, exactly as the read API serializes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct StoredResult {
    pub id: i64,
    pub source: String,
    pub draw_date: NaiveDate,
    pub draw_time: Option<String>,
    pub result_text: String,
    pub signature: String,
    /// Unix seconds of first insertion; immutable.
    pub created_at: i64,
}

/// Fields of a result not yet persisted. `id` and `created_at` are
/// assigned by the store on insertion.
#[derive(Debug, Clone)]
pub struct NewResult {
    pub source: String,
    pub draw_date: NaiveDate,
    pub draw_time: Option<String>,
    pub result_text: String,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Freshly persisted, with its assigned `id` and `created_at`.
    Inserted(StoredResult),
    Duplicate,
}

pub struct Store {
    pool: SqlitePool,
    db_path: Option<PathBuf>,
}

impl Store {
    /// Open (creating if needed) `<data_dir>/results.db` in WAL mode.
    pub async fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("creating data dir {}", data_dir.display()))?;
        let db_path = data_dir.join("results.db");

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("opening {}", db_path.display()))?;

        let store = Self {
            pool,
            db_path: Some(db_path),
        };
        store.migrate().await?;
        Ok(store)
    }

    /// In-memory store for tests. Single connection: each SQLite
    /// `:memory:` connection is its own database.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("opening in-memory sqlite")?;
        let store = Self {
            pool,
            db_path: None,
        };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .context("applying results schema")?;
        Ok(())
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Idempotent insert keyed on `signature`.
    ///
    /// The uniqueness check and the write are one statement; concurrent
    /// callers with the same signature get exactly one `Inserted` between
    /// them and `Duplicate` for the rest.
    pub async fn insert(&self, new: &NewResult) -> Result<InsertOutcome> {
        let created_at = chrono::Utc::now().timestamp();
        let row = sqlx::query_as::<_, StoredResult>(
            r#"
            INSERT INTO results (source, draw_date, draw_time, result_text, signature, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(signature) DO NOTHING
            RETURNING id, source, draw_date, draw_time, result_text, signature, created_at
            "#,
        )
        .bind(&new.source)
        .bind(new.draw_date)
        .bind(&new.draw_time)
        .bind(&new.result_text)
        .bind(&new.signature)
        .bind(created_at)
        .fetch_optional(&self.pool)
        .await
        .context("inserting result")?;

        Ok(match row {
            Some(stored) => InsertOutcome::Inserted(stored),
            None => InsertOutcome::Duplicate,
        })
    }

    /// Most recently inserted result (greatest `created_at`, ties broken
    /// by greatest `id`).
    pub async fn latest(&self) -> Result<Option<StoredResult>> {
        sqlx::query_as::<_, StoredResult>(
            r#"
            SELECT id, source, draw_date, draw_time, result_text, signature, created_at
            FROM results
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .context("querying latest result")
    }

    /// All results with `draw_date` in `[from, to]`, newest insertion first.
    pub async fn range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<StoredResult>> {
        sqlx::query_as::<_, StoredResult>(
            r#"
            SELECT id, source, draw_date, draw_time, result_text, signature, created_at
            FROM results
            WHERE draw_date >= ? AND draw_date <= ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .context("querying result range")
    }

    pub async fn by_date(&self, date: NaiveDate) -> Result<Vec<StoredResult>> {
        sqlx::query_as::<_, StoredResult>(
            r#"
            SELECT id, source, draw_date, draw_time, result_text, signature, created_at
            FROM results
            WHERE draw_date = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .context("querying results by date")
    }

    /// Remove all results with `draw_date < cutoff`. Returns rows removed.
    pub async fn delete_older_than(&self, cutoff: NaiveDate) -> Result<u64> {
        let done = sqlx::query("DELETE FROM results WHERE draw_date < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .context("deleting old results")?;
        Ok(done.rows_affected())
    }

    pub async fn row_count(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM results")
            .fetch_one(&self.pool)
            .await
            .context("counting results")
    }
}
