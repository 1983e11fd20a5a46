//! Capture repository for capture envelope persistence.

use lpscope_domain::{Capture, CaptureId};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;

/// Builds a capture from a `captures` row.
fn capture_from_row(row: &PgRow) -> Result<Capture, sqlx::Error> {
    Ok(Capture {
        id: CaptureId(row.try_get("id")?),
        protocol: row.try_get("protocol")?,
        captured_at: row.try_get("captured_at")?,
        content: row.try_get("content")?,
        url: row.try_get("url")?,
        title: row.try_get("title")?,
        image: row.try_get("image")?,
    })
}

/// Repository for capture rows.
#[derive(Clone)]
pub struct CaptureRepository {
    pool: Arc<PgPool>,
}

impl CaptureRepository {
    /// Creates a new CaptureRepository.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Inserts a capture envelope.
    ///
    /// # Errors
    /// Returns an error if the query fails or the id already exists.
    pub async fn insert(&self, capture: &Capture) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO captures (id, protocol, captured_at, url, title, content, image)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(capture.id.0)
        .bind(&capture.protocol)
        .bind(capture.captured_at)
        .bind(&capture.url)
        .bind(&capture.title)
        .bind(&capture.content)
        .bind(&capture.image)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    /// Finds a capture by its ID.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn find_by_id(&self, id: CaptureId) -> Result<Option<Capture>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM captures WHERE id = $1")
            .bind(id.0)
            .fetch_optional(self.pool.as_ref())
            .await?;
        row.as_ref().map(capture_from_row).transpose()
    }

    /// Finds the most recent captures.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn find_recent(&self, limit: usize) -> Result<Vec<Capture>, sqlx::Error> {
        let rows = sqlx::query("SELECT * FROM captures ORDER BY created_at DESC LIMIT $1")
            .bind(limit as i64)
            .fetch_all(self.pool.as_ref())
            .await?;
        rows.iter().map(capture_from_row).collect()
    }

    /// Deletes a capture by ID. Positions are removed by the cascade.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn delete(&self, id: CaptureId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM captures WHERE id = $1")
            .bind(id.0)
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
