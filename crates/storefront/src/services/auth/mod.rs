//! Authentication service.
//!
//! Username/password accounts for customers plus the owner login, which
//! checks the deployment-configured admin password and bootstraps the owner
//! account on first use.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::instrument;

use konvy_core::{Email, UserId, UserRole, check_login, check_registration};

use crate::config::AdminConfig;
use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Owner login material held in memory.
///
/// The plaintext password from configuration is hashed once at startup and
/// dropped; only the hash is kept.
#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub email: Email,
    password_hash: String,
}

impl AdminCredentials {
    /// Hash the configured admin password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHash` if hashing fails.
    pub fn from_config(config: &AdminConfig) -> Result<Self, AuthError> {
        Ok(Self {
            username: config.username.clone(),
            email: config.email.clone(),
            password_hash: hash_password(config.password.expose_secret())?,
        })
    }

    fn is_reserved(&self, username: &str) -> bool {
        self.username.eq_ignore_ascii_case(username)
    }
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a customer account and mark it online.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Invalid` if a credential check fails (no storage
    /// call is made in that case).
    /// Returns `AuthError::UserAlreadyExists` if the username is taken or
    /// reserved for the owner.
    #[instrument(skip(self, password, confirm_password, admin))]
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        confirm_password: &str,
        admin: &AdminCredentials,
    ) -> Result<User, AuthError> {
        let username = check_registration(username, password, confirm_password)?;

        if admin.is_reserved(username.as_str()) {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = hash_password(password)?;
        let email = Email::for_local_account(&username, Utc::now());

        let mut user = self
            .users
            .create(&username, &email, &password_hash, UserRole::Customer)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        user.is_online = self.mark_online(user.id).await;

        tracing::info!(user_id = %user.id, "Customer registered");
        Ok(user)
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Invalid` if a credential check fails.
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = check_login(username, password)?;

        let (mut user, password_hash) = self
            .users
            .get_password_hash(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        user.is_online = self.mark_online(user.id).await;
        Ok(user)
    }

    /// Login to the owner dashboard.
    ///
    /// Creates the owner account the first time; later logins refresh its
    /// stored hash so a rotated admin password also works for plain login.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidAdminPassword` if the password is wrong.
    /// Returns `AuthError::OwnerNameTaken` if a customer holds the owner username.
    #[instrument(skip(self, password, admin))]
    pub async fn admin_login(
        &self,
        password: &str,
        admin: &AdminCredentials,
    ) -> Result<User, AuthError> {
        verify_password(password, &admin.password_hash)
            .map_err(|_| AuthError::InvalidAdminPassword)?;

        let mut user = self
            .users
            .ensure_owner(&admin.username, &admin.email, &admin.password_hash)
            .await?;

        if !user.role.is_owner() {
            return Err(AuthError::OwnerNameTaken(admin.username.clone()));
        }

        user.is_online = self.mark_online(user.id).await;
        Ok(user)
    }

    /// Flag the account online; `false` if the update failed.
    async fn mark_online(&self, user_id: UserId) -> bool {
        presence_recorded(user_id, self.users.set_online(user_id, true).await)
    }

    /// Mark a user offline.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the update fails.
    pub async fn logout(&self, user_id: UserId) -> Result<(), AuthError> {
        self.users.set_online(user_id, false).await?;
        Ok(())
    }

    /// Fetch the account behind a session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the account no longer exists.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// A failed presence update is logged and otherwise ignored.
fn presence_recorded(user_id: UserId, result: Result<(), RepositoryError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to update presence");
            false
        }
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
