//! Database operations for the storefront `PostgreSQL`.
//!
//! ## Tables (schema `konvy`)
//!
//! - `users` - Accounts with role and presence
//! - `orders` - Redeemable orders, unique by normalized code
//! - `chat_conversations` - One support thread per customer
//! - `chat_messages` - Immutable messages, ordered by creation time
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! Uniqueness (usernames, order codes, one conversation per customer) is
//! enforced by unique indexes; repositories translate violations into
//! [`RepositoryError::Conflict`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p konvy-cli -- migrate
//! ```

pub mod chat;
pub mod orders;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use chat::{ChatRepository, Participant};
pub use orders::{NewOrder, OrderRepository};
pub use users::UserRepository;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate order code).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique violation to [`RepositoryError::Conflict`], anything else to
/// [`RepositoryError::Database`].
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
