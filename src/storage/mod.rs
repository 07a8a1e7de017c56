//! Relational record store for downloaded papers and chat history.
//!
//! The discovery core never touches these tables. They back the chat layer,
//! which registers a paper once it has been embedded and keeps a per-paper
//! conversation log.
//!
//! - [`PdfFileRepository`]: one row per stored PDF, keyed by unique filename
//! - [`ChatLog`]: append-only messages keyed by namespace and sequence number

pub mod chat;
pub mod pdf_files;

pub use chat::{ChatLog, ChatMessage};
pub use pdf_files::{PdfFile, PdfFileRepository};

use crate::error::Result;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{info, instrument};

const CREATE_PDF_FILES: &str = r"
    CREATE TABLE IF NOT EXISTS pdf_files (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        namespace TEXT NOT NULL,
        pdf_name TEXT NOT NULL UNIQUE,
        pdf_title TEXT NOT NULL
    )
";

const CREATE_CHAT_MESSAGES: &str = r"
    CREATE TABLE IF NOT EXISTS chat_messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        namespace TEXT NOT NULL,
        sequence_number INTEGER NOT NULL,
        ai_message TEXT NOT NULL,
        human_message TEXT NOT NULL,
        UNIQUE (namespace, sequence_number)
    )
";

/// Handle to the SQLite database.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if missing) the database at `url` and ensure the schema
    /// exists. `sqlite::memory:` works for tests.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // In-memory databases live exactly as long as their one connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        info!("Database ready");
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(CREATE_PDF_FILES).execute(&self.pool).await?;
        sqlx::query(CREATE_CHAT_MESSAGES).execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Repository over the PDF catalog, sharing this pool.
    pub fn pdf_files(&self) -> PdfFileRepository {
        PdfFileRepository::new(self.pool.clone())
    }

    /// Chat log over the same pool.
    pub fn chat_log(&self) -> ChatLog {
        ChatLog::new(self.pool.clone())
    }
}
