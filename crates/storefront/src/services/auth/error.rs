//! Authentication error types.

use thiserror::Error;

use konvy_core::CredentialError;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username/password failed the length or confirmation checks.
    #[error("{0}")]
    Invalid(#[from] CredentialError),

    /// Wrong password or unknown username.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Wrong owner dashboard password.
    #[error("invalid admin password")]
    InvalidAdminPassword,

    /// Username is taken (or reserved for the owner).
    #[error("user already exists")]
    UserAlreadyExists,

    /// A customer account holds the configured owner username.
    #[error("owner username `{0}` belongs to a customer account")]
    OwnerNameTaken(String),

    /// Session refers to a user that no longer exists.
    #[error("user not found")]
    UserNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
