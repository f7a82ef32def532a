//! Customer list for the owner.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use konvy_core::Presence;

use crate::db::UserRepository;
use crate::error::AppError;
use crate::middleware::RequireOwner;
use crate::models::User;
use crate::state::AppState;

/// A customer with presence derived from the online flag and last activity.
#[derive(Debug, Serialize)]
pub struct UserView {
    #[serde(flatten)]
    pub user: User,
    pub presence: Presence,
}

impl UserView {
    fn at(user: User, now: DateTime<Utc>) -> Self {
        let mut presence = Presence::at(Some(user.last_active), now);
        // Logged out users are offline however recent their activity.
        presence.online &= user.is_online;
        Self { user, presence }
    }
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserView>,
}

/// Every customer account, newest first.
///
/// GET /api/admin/users
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
pub async fn index(
    State(state): State<AppState>,
    RequireOwner(_owner): RequireOwner,
) -> Result<Json<UsersResponse>, AppError> {
    let now = Utc::now();
    let users = UserRepository::new(state.pool()).list_customers().await?;

    Ok(Json(UsersResponse {
        users: users.into_iter().map(|u| UserView::at(u, now)).collect(),
    }))
}
