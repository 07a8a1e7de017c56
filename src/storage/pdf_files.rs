//! Catalog of PDFs handed to the chat layer.

use crate::error::Result;
use sqlx::SqlitePool;
use tracing::{debug, instrument};

/// One stored PDF.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PdfFile {
    pub id: i64,
    /// Grouping key shared with the paper's embeddings and chat history.
    pub namespace: String,
    /// Unique filename, e.g. `pdfs/2401.00001__1-1-24__Title.pdf`.
    pub pdf_name: String,
    pub pdf_title: String,
}

/// CRUD over the `pdf_files` table.
#[derive(Debug, Clone)]
pub struct PdfFileRepository {
    pool: SqlitePool,
}

impl PdfFileRepository {
    /// Usually obtained through [`crate::storage::Database::pdf_files`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a record. Returns `false` if `pdf_name` is already stored.
    #[instrument(level = "debug", skip(self))]
    pub async fn create(&self, namespace: &str, pdf_name: &str, pdf_title: &str) -> Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO pdf_files (namespace, pdf_name, pdf_title) VALUES (?, ?, ?)",
        )
        .bind(namespace)
        .bind(pdf_name)
        .bind(pdf_title)
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() == 1;
        if !inserted {
            debug!("PDF already catalogued");
        }
        Ok(inserted)
    }

    /// Look a record up by its unique filename.
    ///
    /// # Returns
    ///
    /// `None` if no record has that name.
    pub async fn get(&self, pdf_name: &str) -> Result<Option<PdfFile>> {
        let row = sqlx::query_as::<_, PdfFile>(
            "SELECT id, namespace, pdf_name, pdf_title FROM pdf_files WHERE pdf_name = ?",
        )
        .bind(pdf_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Returns `false` if no such record exists.
    pub async fn update_title(&self, pdf_name: &str, pdf_title: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE pdf_files SET pdf_title = ? WHERE pdf_name = ?")
            .bind(pdf_title)
            .bind(pdf_name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns `false` if no such record exists.
    pub async fn delete(&self, pdf_name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM pdf_files WHERE pdf_name = ?")
            .bind(pdf_name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Every record in insertion order.
    pub async fn list(&self) -> Result<Vec<PdfFile>> {
        let rows = sqlx::query_as::<_, PdfFile>(
            "SELECT id, namespace, pdf_name, pdf_title FROM pdf_files ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
