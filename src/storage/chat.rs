//! Append-only chat history per namespace.

use crate::error::Result;
use sqlx::SqlitePool;
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ChatMessage {
    pub namespace: String,
    pub sequence_number: i64,
    pub ai_message: String,
    pub human_message: String,
}

/// Conversation log stored in `chat_messages`.
#[derive(Debug, Clone)]
pub struct ChatLog {
    pool: SqlitePool,
}

impl ChatLog {
    /// Usually obtained through [`crate::storage::Database::chat_log`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append an exchange and return its sequence number. Numbering starts at
    /// 0 and increases by one per namespace.
    #[instrument(level = "debug", skip(self, ai_message, human_message))]
    pub async fn add_message(
        &self,
        namespace: &str,
        ai_message: &str,
        human_message: &str,
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let sequence_number: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(sequence_number) + 1, 0) FROM chat_messages WHERE namespace = ?",
        )
        .bind(namespace)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO chat_messages (namespace, sequence_number, ai_message, human_message)
             VALUES (?, ?, ?, ?)",
        )
        .bind(namespace)
        .bind(sequence_number)
        .bind(ai_message)
        .bind(human_message)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(sequence_number)
    }

    /// All messages in `namespace`, oldest first.
    pub async fn messages(&self, namespace: &str) -> Result<Vec<ChatMessage>> {
        let rows = sqlx::query_as::<_, ChatMessage>(
            "SELECT namespace, sequence_number, ai_message, human_message
             FROM chat_messages WHERE namespace = ? ORDER BY sequence_number",
        )
        .bind(namespace)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// `(human, ai)` pairs in conversation order, the shape retrieval chains
    /// expect for chat history.
    pub async fn conversation(&self, namespace: &str) -> Result<Vec<(String, String)>> {
        Ok(self
            .messages(namespace)
            .await?
            .into_iter()
            .map(|m| (m.human_message, m.ai_message))
            .collect())
    }
}
