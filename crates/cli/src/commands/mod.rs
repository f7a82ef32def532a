//! CLI command implementations.

pub mod migrate;
pub mod order;

use secrecy::SecretString;
use thiserror::Error;

/// Errors shared by the commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Order(#[from] konvy_storefront::services::OrderError),

    #[error(transparent)]
    Repository(#[from] konvy_storefront::db::RepositoryError),

    /// The owner account has not been bootstrapped yet.
    #[error("Owner account `{0}` not found; log in to the admin dashboard once first")]
    OwnerNotFound(String),
}

/// `KONVY_DATABASE_URL`, falling back to `DATABASE_URL`.
pub fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("KONVY_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("KONVY_DATABASE_URL"))
}
