//! Support chat between customers and the owner.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use konvy_core::{ConversationId, Presence};

use crate::db::{ChatRepository, Participant, RepositoryError};
use crate::models::{Conversation, CurrentUser, Message};

/// Errors from chat operations.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message body is empty")]
    EmptyMessage,

    #[error("conversation not found")]
    ConversationNotFound,

    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ChatError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::ConversationNotFound,
            other => Self::Repository(other),
        }
    }
}

/// A conversation with both sides' presence resolved.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationView {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub customer_presence: Presence,
    pub admin_presence: Presence,
}

impl ConversationView {
    #[must_use]
    pub fn at(conversation: Conversation, now: DateTime<Utc>) -> Self {
        Self {
            customer_presence: Presence::at(conversation.user_last_seen, now),
            admin_presence: Presence::at(conversation.admin_last_seen, now),
            conversation,
        }
    }
}

/// A conversation thread as loaded by one side.
#[derive(Debug, Clone, Serialize)]
pub struct Thread {
    pub conversation: ConversationView,
    pub messages: Vec<Message>,
}

/// Chat service.
pub struct ChatService<'a> {
    chat: ChatRepository<'a>,
}

impl<'a> ChatService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            chat: ChatRepository::new(pool),
        }
    }

    /// Open (creating on first use) the customer's support thread.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Repository` if a query fails.
    #[instrument(skip(self, customer), fields(user_id = %customer.id))]
    pub async fn open_customer_thread(&self, customer: &CurrentUser) -> Result<Thread, ChatError> {
        let conversation = self
            .chat
            .open_for_customer(customer.id, &customer.username)
            .await?;
        let messages = self.chat.messages(conversation.id).await?;

        Ok(Thread {
            conversation: ConversationView::at(conversation, Utc::now()),
            messages,
        })
    }

    /// Send a message from the customer to the owner.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::EmptyMessage` if the body is blank.
    #[instrument(skip(self, customer, body), fields(user_id = %customer.id))]
    pub async fn send_as_customer(
        &self,
        customer: &CurrentUser,
        body: &str,
    ) -> Result<Thread, ChatError> {
        let body = non_empty_body(body)?;

        let conversation = self
            .chat
            .open_for_customer(customer.id, &customer.username)
            .await?;
        self.chat
            .append(
                conversation.id,
                customer.id,
                &customer.username,
                body,
                Participant::Customer,
            )
            .await?;

        self.open_customer_thread(customer).await
    }

    /// Every conversation, most recently active first.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Repository` if the query fails.
    pub async fn list_conversations(&self) -> Result<Vec<ConversationView>, ChatError> {
        let now = Utc::now();
        Ok(self
            .chat
            .list()
            .await?
            .into_iter()
            .map(|c| ConversationView::at(c, now))
            .collect())
    }

    /// Open a conversation from the admin dashboard.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::ConversationNotFound` if the ID is unknown.
    #[instrument(skip(self))]
    pub async fn open_admin_thread(&self, id: ConversationId) -> Result<Thread, ChatError> {
        let conversation = self
            .chat
            .touch_admin_seen(id)
            .await?
            .ok_or(ChatError::ConversationNotFound)?;
        let messages = self.chat.messages(id).await?;

        Ok(Thread {
            conversation: ConversationView::at(conversation, Utc::now()),
            messages,
        })
    }

    /// Reply to a customer from the admin dashboard.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::EmptyMessage` if the body is blank.
    /// Returns `ChatError::ConversationNotFound` if the ID is unknown.
    #[instrument(skip(self, admin, body))]
    pub async fn send_as_admin(
        &self,
        admin: &CurrentUser,
        id: ConversationId,
        body: &str,
    ) -> Result<Thread, ChatError> {
        let body = non_empty_body(body)?;

        self.chat
            .append(id, admin.id, &admin.username, body, Participant::Admin)
            .await?;

        self.open_admin_thread(id).await
    }
}

fn non_empty_body(body: &str) -> Result<&str, ChatError> {
    let body = body.trim();
    if body.is_empty() {
        Err(ChatError::EmptyMessage)
    } else {
        Ok(body)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;
    use konvy_core::{ConversationStatus, UserId};

    use super::*;

    fn conversation(now: DateTime<Utc>) -> Conversation {
        Conversation {
            id: ConversationId::new(1),
            user_id: UserId::new(7),
            username: "ninja".to_string(),
            admin_last_seen: None,
            user_last_seen: Some(now - TimeDelta::minutes(2)),
            status: ConversationStatus::Active,
            created_at: now - TimeDelta::days(1),
            updated_at: now - TimeDelta::minutes(2),
        }
    }

    #[test]
    fn test_body_is_trimmed() {
        assert_eq!(non_empty_body("  hello \n").unwrap(), "hello");
        assert!(matches!(non_empty_body(" \t\n"), Err(ChatError::EmptyMessage)));
        assert!(matches!(non_empty_body(""), Err(ChatError::EmptyMessage)));
    }

    #[test]
    fn test_missing_conversation_maps_to_not_found() {
        assert!(matches!(
            ChatError::from(RepositoryError::NotFound),
            ChatError::ConversationNotFound
        ));
    }

    #[test]
    fn test_view_resolves_both_sides() {
        let now = Utc::now();
        let view = ConversationView::at(conversation(now), now);

        assert!(view.customer_presence.online);
        assert_eq!(view.customer_presence.label, "2m ago");
        assert!(!view.admin_presence.online);
        assert_eq!(view.admin_presence.label, "Never");
    }

    #[test]
    fn test_view_serializes_flat() {
        let now = Utc::now();
        let json = serde_json::to_value(ConversationView::at(conversation(now), now)).unwrap();

        assert_eq!(json["username"], "ninja");
        assert_eq!(json["status"], "active");
        assert_eq!(json["customer_presence"]["online"], true);
        assert_eq!(json["admin_presence"]["label"], "Never");
    }
}
