//! Support conversations from the owner's side.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use konvy_core::ConversationId;

use crate::error::{ApiJson, AppError};
use crate::middleware::RequireOwner;
use crate::services::{ChatService, ConversationView, Thread};
use crate::state::AppState;

/// Reply request body.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct ConversationsResponse {
    pub conversations: Vec<ConversationView>,
}

/// A reply's result: the reloaded thread and conversation list.
#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    #[serde(flatten)]
    pub thread: Thread,
    pub conversations: Vec<ConversationView>,
}

/// Every conversation, most recently active first.
///
/// GET /api/admin/conversations
///
/// # Errors
///
/// Returns `AppError` if the query fails.
pub async fn conversations(
    State(state): State<AppState>,
    RequireOwner(_owner): RequireOwner,
) -> Result<Json<ConversationsResponse>, AppError> {
    let conversations = ChatService::new(state.pool()).list_conversations().await?;
    Ok(Json(ConversationsResponse { conversations }))
}

/// Open a conversation.
///
/// GET /api/admin/conversations/{id}/messages
///
/// # Errors
///
/// Returns `AppError::Chat` if the conversation does not exist.
pub async fn messages(
    State(state): State<AppState>,
    RequireOwner(_owner): RequireOwner,
    Path(id): Path<ConversationId>,
) -> Result<Json<Thread>, AppError> {
    let thread = ChatService::new(state.pool()).open_admin_thread(id).await?;
    Ok(Json(thread))
}

/// Reply to a customer.
///
/// POST /api/admin/conversations/{id}/messages
///
/// # Errors
///
/// Returns `AppError::Chat` if the body is blank or the conversation does
/// not exist.
pub async fn send_message(
    State(state): State<AppState>,
    RequireOwner(owner): RequireOwner,
    Path(id): Path<ConversationId>,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> Result<Json<ReplyResponse>, AppError> {
    let chat = ChatService::new(state.pool());
    let thread = chat.send_as_admin(&owner, id, &req.body).await?;
    let conversations = chat.list_conversations().await?;

    Ok(Json(ReplyResponse {
        thread,
        conversations,
    }))
}
