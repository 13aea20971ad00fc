//! Metadata persistence.
//!
//! Users and submissions are upserted into sqlite, keyed by handle and
//! submission id respectively. Writing the same record twice is harmless.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::FromRow;

use crate::model::{Identity, Submission};
use crate::Result;

/// Where identities and submissions are recorded. Both upserts overwrite on conflict.
#[async_trait]
pub trait MetadataSink: Send + Sync {
    async fn upsert_identity(&self, identity: &Identity) -> Result<()>;
    async fn upsert_submission(&self, submission: &Submission) -> Result<()>;
    async fn submissions_for_handle(&self, handle: &str) -> Result<Vec<Submission>>;
}

/// sqlite-backed [`MetadataSink`].
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

#[derive(Debug, FromRow)]
struct SubmissionRow {
    id: String,
    title: String,
    handle: String,
    account_name: Option<String>,
    content_url: String,
    content_name: String,
    is_scrap: bool,
    uploaded_at: Option<String>,
}

impl From<SubmissionRow> for Submission {
    fn from(row: SubmissionRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            owner_handle: row.handle,
            owner_account_name: row.account_name,
            content_url: row.content_url,
            content_name: row.content_name,
            is_secondary: row.is_scrap,
            uploaded_at: row
                .uploaded_at
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

impl Database {
    /// Opens (or creates) the database file and makes sure the tables exist.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        let db = Self { pool };
        db.create_tables().await?;
        Ok(db)
    }

    async fn create_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                handle TEXT PRIMARY KEY,
                account_name TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS submissions (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                handle TEXT NOT NULL,
                account_name TEXT,
                content_url TEXT NOT NULL,
                content_name TEXT NOT NULL,
                is_scrap INTEGER NOT NULL,
                uploaded_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_submissions_handle ON submissions(handle)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn identity(&self, handle: &str) -> Result<Option<Identity>> {
        let row: Option<(String, Option<String>)> =
            sqlx::query_as("SELECT handle, account_name FROM users WHERE handle = ?")
                .bind(handle)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(handle, account_name)| Identity {
            handle,
            account_name,
        }))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl MetadataSink for Database {
    async fn upsert_identity(&self, identity: &Identity) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (handle, account_name)
            VALUES (?, ?)
            ON CONFLICT(handle) DO UPDATE SET account_name = excluded.account_name
            "#,
        )
        .bind(&identity.handle)
        .bind(&identity.account_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_submission(&self, submission: &Submission) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO submissions (
                id, title, handle, account_name, content_url, content_name, is_scrap, uploaded_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                handle = excluded.handle,
                account_name = excluded.account_name,
                content_url = excluded.content_url,
                content_name = excluded.content_name,
                is_scrap = excluded.is_scrap,
                uploaded_at = excluded.uploaded_at
            "#,
        )
        .bind(&submission.id)
        .bind(&submission.title)
        .bind(&submission.owner_handle)
        .bind(&submission.owner_account_name)
        .bind(&submission.content_url)
        .bind(&submission.content_name)
        .bind(submission.is_secondary)
        .bind(submission.uploaded_at.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn submissions_for_handle(&self, handle: &str) -> Result<Vec<Submission>> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, title, handle, account_name, content_url, content_name, is_scrap, uploaded_at
            FROM submissions
            WHERE handle = ?
            ORDER BY id
            "#,
        )
        .bind(handle.to_lowercase())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Submission::from).collect())
    }
}
