//! Authentication route handlers.
//!
//! Customer registration/login and the owner dashboard login. All
//! endpoints are JSON; the session cookie carries the logged-in identity.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::{ApiJson, AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalUser, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::{AuthError, AuthService, TrackingEvent};
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Registration request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

/// Owner login request body.
#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub password: String,
}

/// The logged-in account.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: User,
}

/// `GET /api/auth/me` response; `user` is null when logged out.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Option<User>,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

async fn start_session(session: &Session, user: &User) -> Result<(), AppError> {
    set_current_user(session, &CurrentUser::from(user)).await?;
    set_sentry_user(user);
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a customer account and log it in.
///
/// POST /api/auth/register
///
/// # Errors
///
/// Returns `AppError::Auth` on validation failure or a taken username.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let auth = AuthService::new(state.pool());
    let user = auth
        .register(
            &req.username,
            &req.password,
            &req.confirm_password,
            state.admin(),
        )
        .await?;

    state.tracking().dispatch(TrackingEvent::Registration {
        username: user.username.clone(),
        user_id: user.id,
        email: user.email.clone(),
        role: user.role,
        registration_date: user.created_at,
    });

    start_session(&session, &user).await?;
    Ok(Json(SessionResponse { user }))
}

/// Log in with username and password.
///
/// POST /api/auth/login
///
/// # Errors
///
/// Returns `AppError::Auth` if validation fails or the credentials are wrong.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let auth = AuthService::new(state.pool());
    let user = auth.login(&req.username, &req.password).await?;

    start_session(&session, &user).await?;
    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(SessionResponse { user }))
}

/// Log in to the owner dashboard with the configured admin password.
///
/// POST /api/admin/login
///
/// # Errors
///
/// Returns `AppError::Auth` if the password is wrong.
pub async fn admin_login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(req): ApiJson<AdminLoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let auth = AuthService::new(state.pool());
    let user = auth.admin_login(&req.password, state.admin()).await?;

    start_session(&session, &user).await?;
    tracing::info!(user_id = %user.id, "Owner logged in");
    Ok(Json(SessionResponse { user }))
}

/// Log out and mark the account offline.
///
/// POST /api/auth/logout
///
/// # Errors
///
/// Returns `AppError` if the session cannot be cleared.
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(current): OptionalUser,
) -> Result<Json<LogoutResponse>, AppError> {
    if let Some(current) = current {
        if let Err(e) = AuthService::new(state.pool()).logout(current.id).await {
            tracing::warn!(user_id = %current.id, error = %e, "Failed to mark user offline");
        }
    }

    clear_current_user(&session).await?;
    clear_sentry_user();

    Ok(Json(LogoutResponse { success: true }))
}

/// The logged-in account, refreshed from storage.
///
/// GET /api/auth/me
///
/// # Errors
///
/// Returns `AppError::Database` if the lookup fails.
pub async fn me(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(current): OptionalUser,
) -> Result<Json<MeResponse>, AppError> {
    let Some(current) = current else {
        return Ok(Json(MeResponse { user: None }));
    };

    match AuthService::new(state.pool()).get_user(current.id).await {
        Ok(user) => Ok(Json(MeResponse { user: Some(user) })),
        Err(AuthError::UserNotFound) => {
            // Account vanished; drop the stale session.
            let _ = clear_current_user(&session).await;
            Ok(Json(MeResponse { user: None }))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_uses_camel_case() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"username": "ninja", "password": "hunter22", "confirmPassword": "hunter22"}"#,
        )
        .unwrap();
        assert_eq!(req.confirm_password, "hunter22");
    }

    #[test]
    fn test_admin_login_request() {
        let req: AdminLoginRequest = serde_json::from_str(r#"{"password": "x"}"#).unwrap();
        assert_eq!(req.password, "x");
    }
}
