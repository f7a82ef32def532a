//! Chat repository for conversations and messages.

use sqlx::PgPool;

use konvy_core::{ConversationId, UserId};

use super::RepositoryError;
use crate::models::{Conversation, Message};

const CONVERSATION_COLUMNS: &str =
    "id, user_id, username, admin_last_seen, user_last_seen, status, created_at, updated_at";

const MESSAGE_COLUMNS: &str =
    "id, conversation_id, sender_id, sender_username, body, is_admin, created_at";

/// Who is writing to or reading a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Participant {
    Customer,
    Admin,
}

impl Participant {
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Repository for chat database operations.
pub struct ChatRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ChatRepository<'a> {
    /// Create a new chat repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find or create the customer's conversation and mark the customer as
    /// present in it.
    ///
    /// A single upsert on the unique `user_id`, so concurrent calls for the
    /// same customer converge on one row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn open_for_customer(
        &self,
        user_id: UserId,
        username: &str,
    ) -> Result<Conversation, RepositoryError> {
        let conversation = sqlx::query_as::<_, Conversation>(&format!(
            r"
            INSERT INTO konvy.chat_conversations (user_id, username, user_last_seen, status)
            VALUES ($1, $2, NOW(), 'active')
            ON CONFLICT (user_id) DO UPDATE SET user_last_seen = NOW()
            RETURNING {CONVERSATION_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(username)
        .fetch_one(self.pool)
        .await?;

        Ok(conversation)
    }

    /// Get a conversation by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ConversationId) -> Result<Option<Conversation>, RepositoryError> {
        let conversation = sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM konvy.chat_conversations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(conversation)
    }

    /// All conversations, most recently active first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Conversation>, RepositoryError> {
        let conversations = sqlx::query_as::<_, Conversation>(&format!(
            r"
            SELECT {CONVERSATION_COLUMNS}
            FROM konvy.chat_conversations
            ORDER BY updated_at DESC, id DESC
            "
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(conversations)
    }

    /// Mark the owner as present in a conversation.
    ///
    /// Returns `None` if the conversation does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn touch_admin_seen(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let conversation = sqlx::query_as::<_, Conversation>(&format!(
            r"
            UPDATE konvy.chat_conversations
            SET admin_last_seen = NOW()
            WHERE id = $1
            RETURNING {CONVERSATION_COLUMNS}
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(conversation)
    }

    /// Messages of a conversation in creation order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn messages(&self, id: ConversationId) -> Result<Vec<Message>, RepositoryError> {
        let messages = sqlx::query_as::<_, Message>(&format!(
            r"
            SELECT {MESSAGE_COLUMNS}
            FROM konvy.chat_messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC, id ASC
            "
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(messages)
    }

    /// Append a message and advance the conversation's activity markers.
    ///
    /// Runs in one transaction: the conversation's `updated_at` (never moved
    /// backwards) and the sender side's last-seen timestamp are updated
    /// together with the insert.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the conversation does not exist.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn append(
        &self,
        id: ConversationId,
        sender_id: UserId,
        sender_username: &str,
        body: &str,
        from: Participant,
    ) -> Result<Message, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query(
            r"
            UPDATE konvy.chat_conversations
            SET updated_at = GREATEST(updated_at, NOW()),
                admin_last_seen = CASE WHEN $2 THEN NOW() ELSE admin_last_seen END,
                user_last_seen = CASE WHEN $2 THEN user_last_seen ELSE NOW() END
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(from.is_admin())
        .execute(&mut *tx)
        .await?;

        if touched.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let message = sqlx::query_as::<_, Message>(&format!(
            r"
            INSERT INTO konvy.chat_messages
                (conversation_id, sender_id, sender_username, body, is_admin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {MESSAGE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(sender_id)
        .bind(sender_username)
        .bind(body)
        .bind(from.is_admin())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(message)
    }
}
