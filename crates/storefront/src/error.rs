//! Error responses for the JSON API.
//!
//! Handlers return `Result<_, AppError>`. Every error renders as
//! `{ "error": "<message>" }`; server-side failures are reported to Sentry
//! and the client only sees a generic message.
//!
//! Request bodies are read with [`ApiJson`] so that malformed JSON gets the
//! same error shape.

use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::User;
use crate::services::{AuthError, ChatError, OrderError};

/// `axum::Json` whose rejection renders as an [`AppError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// The request body was not the JSON the route expects.
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order operation failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Chat operation failed.
    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    /// The session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

const INTERNAL_MESSAGE: &str = "Internal server error";

impl AppError {
    /// Status code and client-safe message.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Database(_) | Self::Session(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
            }
            Self::InvalidBody(_) => (StatusCode::BAD_REQUEST, "Invalid request body".to_string()),
            Self::Auth(err) => match err {
                AuthError::Invalid(e) => (StatusCode::BAD_REQUEST, e.to_string()),
                AuthError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "Invalid username or password".to_string(),
                ),
                AuthError::InvalidAdminPassword => (
                    StatusCode::UNAUTHORIZED,
                    "Invalid admin password".to_string(),
                ),
                AuthError::UserNotFound => (
                    StatusCode::UNAUTHORIZED,
                    "Please log in to continue".to_string(),
                ),
                AuthError::UserAlreadyExists => {
                    (StatusCode::CONFLICT, "Username already exists".to_string())
                }
                AuthError::OwnerNameTaken(_) | AuthError::Repository(_) | AuthError::PasswordHash => {
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
                }
            },
            Self::Order(err) => match err {
                OrderError::InvalidCode(e) => (StatusCode::BAD_REQUEST, e.to_string()),
                OrderError::MissingFields => (
                    StatusCode::BAD_REQUEST,
                    "Please fill in all fields".to_string(),
                ),
                OrderError::CodeAlreadyExists => (
                    StatusCode::CONFLICT,
                    "Order ID already exists. Please use a different ID.".to_string(),
                ),
                OrderError::AlreadyRedeemed => (
                    StatusCode::CONFLICT,
                    "This order code has already been redeemed".to_string(),
                ),
                OrderError::CodeNotFound => {
                    (StatusCode::NOT_FOUND, "Order code not found".to_string())
                }
                OrderError::NotFound => (StatusCode::NOT_FOUND, "Order not found".to_string()),
                OrderError::NotPending => {
                    (StatusCode::CONFLICT, "Order is not pending".to_string())
                }
                OrderError::RedeemFailed(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to submit order. Please try again.".to_string(),
                ),
                OrderError::CreateFailed(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to create order. Please try again.".to_string(),
                ),
                OrderError::Repository(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
                }
            },
            Self::Chat(err) => match err {
                ChatError::EmptyMessage => (
                    StatusCode::BAD_REQUEST,
                    "Message cannot be empty".to_string(),
                ),
                ChatError::ConversationNotFound => (
                    StatusCode::NOT_FOUND,
                    "Conversation not found".to_string(),
                ),
                ChatError::Repository(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if let Self::InvalidBody(rejection) = &self {
            tracing::debug!(error = %rejection.body_text(), "Rejected request body");
        }

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Attach the logged-in account to subsequent Sentry events.
pub fn set_sentry_user(user: &User) {
    let sentry_user = sentry::User {
        id: Some(user.id.to_string()),
        username: Some(user.username.clone()),
        email: Some(user.email.to_string()),
        ..Default::default()
    };
    sentry::configure_scope(|scope| scope.set_user(Some(sentry_user)));
}

/// Detach the account from the Sentry scope on logout.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| scope.set_user(None));
}

/// Record a user action as a Sentry breadcrumb.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        data: data
            .iter()
            .map(|(k, v)| ((*k).to_string(), serde_json::Value::from(*v)))
            .collect(),
        ..Default::default()
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use konvy_core::{CredentialError, OrderCodeError};

    use super::*;

    fn status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn body(err: AppError) -> serde_json::Value {
        let bytes = axum::body::to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_server_errors() {
        assert_eq!(
            status(RepositoryError::NotFound.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(AuthError::PasswordHash.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_and_unauthorized() {
        assert_eq!(status(OrderError::NotFound.into()), StatusCode::NOT_FOUND);
        assert_eq!(
            status(ChatError::ConversationNotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_validation_errors_are_bad_requests() {
        assert_eq!(
            status(AuthError::Invalid(CredentialError::PasswordMismatch).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(OrderError::InvalidCode(OrderCodeError::Empty).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(OrderError::MissingFields.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(ChatError::EmptyMessage.into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_conflicts() {
        assert_eq!(
            status(AuthError::UserAlreadyExists.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(OrderError::CodeAlreadyExists.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(OrderError::AlreadyRedeemed.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(status(OrderError::NotPending.into()), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_body_carries_user_facing_message() {
        assert_eq!(
            body(OrderError::CodeAlreadyExists.into()).await,
            json!({ "error": "Order ID already exists. Please use a different ID." })
        );
        assert_eq!(
            body(AuthError::Invalid(CredentialError::UsernameTooShort).into()).await,
            json!({ "error": "Username must be at least 2 characters" })
        );
    }

    #[tokio::test]
    async fn test_storage_failures_hide_details() {
        let err = OrderError::RedeemFailed(RepositoryError::NotFound);
        assert_eq!(
            body(err.into()).await,
            json!({ "error": "Failed to submit order. Please try again." })
        );

        let err = AppError::Database(RepositoryError::Conflict("secret detail".to_string()));
        assert_eq!(body(err).await, json!({ "error": "Internal server error" }));
    }

    #[derive(Debug, serde::Deserialize)]
    struct Payload {
        code: String,
    }

    async fn submit(content_type: &str, body: &'static str) -> Response {
        use axum::{Router, routing::post};
        use tower::ServiceExt;

        let app = Router::new().route(
            "/",
            post(|ApiJson(payload): ApiJson<Payload>| async move { payload.code }),
        );
        app.oneshot(
            axum::http::Request::post("/")
                .header("content-type", content_type)
                .body(axum::body::Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_unreadable_bodies_are_json_bad_requests() {
        for (content_type, body) in [
            ("application/json", "{not json"),
            ("application/json", r#"{"other":"field"}"#),
            ("application/json", r#"{"code":7}"#),
            ("text/plain", r#"{"code":"ABC"}"#),
        ] {
            let response = submit(content_type, body).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(response.headers()["content-type"], "application/json");
            assert_eq!(
                json_body(response).await,
                json!({ "error": "Invalid request body" })
            );
        }

        let response = submit("application/json", r#"{"code":"ABC"}"#).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
