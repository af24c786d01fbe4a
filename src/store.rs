//! SQLite persistence for candidate articles and generated posts.
//!
//! This is the session's downstream sink: it may reject a candidate whose
//! title is already known, and that rejection never feeds back into the
//! extraction pipeline.

use crate::generate::GeneratedPost;
use crate::models::CandidateArticle;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use thiserror::Error;
use tracing::instrument;

/// Kept low for SQLite since it uses file-level locking.
const MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database query failed")]
    Db(#[from] sqlx::Error),

    #[error("failed to run migrations")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("failed to encode image list")]
    Json(#[from] serde_json::Error),
}

/// An article row eligible for post generation.
#[derive(Debug, Clone)]
pub struct StoredArticle {
    pub id: i64,
    pub title: String,
    pub intro: String,
}

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Opens (creating if needed) the database at `path` and runs migrations.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().display());
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(&url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// In-memory database, used by tests.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Inserts a candidate; returns `false` when the title is already known.
    pub async fn insert_article(
        &self,
        candidate: &CandidateArticle,
    ) -> Result<bool, StoreError> {
        let images = serde_json::to_string(&candidate.image_refs)?;
        let result = sqlx::query(
            "INSERT OR IGNORE INTO articles (title, intro, body_length, images) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(&candidate.title)
        .bind(&candidate.intro_excerpt)
        .bind(candidate.raw_body_length as i64)
        .bind(&images)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Articles that have not yet been turned into posts.
    pub async fn fetch_unprocessed(&self, limit: u32) -> Result<Vec<StoredArticle>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, title, intro FROM articles \
             WHERE processed_at IS NULL ORDER BY RANDOM() LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| StoredArticle {
                id: row.get("id"),
                title: row.get("title"),
                intro: row.get("intro"),
            })
            .collect())
    }

    pub async fn insert_post(
        &self,
        article_id: i64,
        post: &GeneratedPost,
    ) -> Result<i64, StoreError> {
        let tags = serde_json::to_string(&post.tags)?;
        let result = sqlx::query(
            "INSERT INTO posts (article_id, title, content, category, tags, tldr) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(article_id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.category)
        .bind(&tags)
        .bind(&post.tldr)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn mark_processed(&self, article_id: i64) -> Result<(), StoreError> {
        sqlx::query("UPDATE articles SET processed_at = datetime('now') WHERE id = ?")
            .bind(article_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn article_count(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM articles")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("cnt"))
    }

    pub async fn post_count(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("cnt"))
    }
}
