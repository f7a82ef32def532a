//! Support chat domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use konvy_core::{ConversationId, ConversationStatus, MessageId, UserId};

/// The single support thread between one customer and the owner.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: ConversationId,
    pub user_id: UserId,
    /// Customer username at the time the conversation was opened.
    pub username: String,
    pub admin_last_seen: Option<DateTime<Utc>>,
    pub user_last_seen: Option<DateTime<Utc>>,
    pub status: ConversationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An immutable chat message.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub sender_username: String,
    pub body: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}
