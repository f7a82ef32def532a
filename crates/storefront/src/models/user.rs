//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use konvy_core::{Email, UserId, UserRole};

/// A storefront account. The password hash is never loaded into this type.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub role: UserRole,
    /// Set on login, cleared on logout.
    pub is_online: bool,
    /// Touched on login and on dashboard activity.
    pub last_active: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
