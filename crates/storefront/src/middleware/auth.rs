//! Authentication middleware and extractors.
//!
//! The logged-in account lives in the session as a [`CurrentUser`]. Handlers
//! pick the extractor matching the access they need: [`RequireCustomer`] for
//! the customer dashboard, [`RequireOwner`] for the admin dashboard, or
//! [`OptionalUser`] when anonymous access is fine. The two roles never share
//! a dashboard.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a logged-in customer.
///
/// # Example
///
/// ```rust,ignore
/// async fn orders(RequireCustomer(user): RequireCustomer) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireCustomer(pub CurrentUser);

/// Extractor that requires the logged-in user to be the store owner.
pub struct RequireOwner(pub CurrentUser);

/// Extractor that optionally gets the current user.
pub struct OptionalUser(pub Option<CurrentUser>);

/// Error returned when a request lacks the required identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No session or no user in it.
    Unauthorized,
    /// Logged in, but not as the owner.
    Forbidden,
    /// The owner on a customer-only route.
    CustomerOnly,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Please log in to continue"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Admin access required"),
            Self::CustomerOnly => (StatusCode::FORBIDDEN, "Customer account required"),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn current_user(parts: &Parts) -> Option<CurrentUser> {
    // Set by SessionManagerLayer
    let session = parts.extensions.get::<Session>()?;

    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

impl<S> FromRequestParts<S> for RequireCustomer
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)
            .await
            .ok_or(AuthRejection::Unauthorized)?;

        if user.is_owner() {
            Err(AuthRejection::CustomerOnly)
        } else {
            Ok(Self(user))
        }
    }
}

impl<S> FromRequestParts<S> for RequireOwner
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)
            .await
            .ok_or(AuthRejection::Unauthorized)?;

        if user.is_owner() {
            Ok(Self(user))
        } else {
            Err(AuthRejection::Forbidden)
        }
    }
}

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await))
    }
}

/// Store the logged-in user, issuing a fresh session ID.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Drop the whole session (logout).
///
/// # Errors
///
/// Returns an error if the session store cannot delete it.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use konvy_core::{UserId, UserRole};
    use tower_sessions::MemoryStore;

    use super::*;

    fn user(role: UserRole) -> CurrentUser {
        CurrentUser {
            id: UserId::new(1),
            username: "ninja".to_string(),
            role,
        }
    }

    async fn parts_with(user: Option<CurrentUser>) -> Parts {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        if let Some(user) = user {
            session
                .insert(session_keys::CURRENT_USER, &user)
                .await
                .unwrap();
        }

        let (mut parts, ()) = Request::builder()
            .uri("/api/admin/orders")
            .body(())
            .unwrap()
            .into_parts();
        parts.extensions.insert(session);
        parts
    }

    #[tokio::test]
    async fn test_require_customer_without_session_user() {
        let mut parts = parts_with(None).await;
        let result = RequireCustomer::from_request_parts(&mut parts, &()).await;
        assert_eq!(result.err(), Some(AuthRejection::Unauthorized));
    }

    #[tokio::test]
    async fn test_require_customer_rejects_owner() {
        let mut parts = parts_with(Some(user(UserRole::Owner))).await;
        let result = RequireCustomer::from_request_parts(&mut parts, &()).await;
        assert_eq!(result.err(), Some(AuthRejection::CustomerOnly));
    }

    #[tokio::test]
    async fn test_require_customer_accepts_customer() {
        let mut parts = parts_with(Some(user(UserRole::Customer))).await;
        let RequireCustomer(customer) = RequireCustomer::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(customer.id, UserId::new(1));
    }

    #[tokio::test]
    async fn test_require_owner_rejects_customer() {
        let mut parts = parts_with(Some(user(UserRole::Customer))).await;
        let result = RequireOwner::from_request_parts(&mut parts, &()).await;
        assert_eq!(result.err(), Some(AuthRejection::Forbidden));
    }

    #[tokio::test]
    async fn test_require_owner_accepts_owner() {
        let mut parts = parts_with(Some(user(UserRole::Owner))).await;
        let RequireOwner(owner) = RequireOwner::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(owner.username, "ninja");
    }

    #[tokio::test]
    async fn test_optional_user() {
        let mut parts = parts_with(None).await;
        let OptionalUser(user) = OptionalUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(user.is_none());
    }

    #[test]
    fn test_rejection_statuses() {
        assert_eq!(
            AuthRejection::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthRejection::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthRejection::CustomerOnly.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
