//! User repository for database operations.

use sqlx::PgPool;

use konvy_core::{Email, UserId, UserRole, Username};

use super::RepositoryError;
use crate::models::User;

const USER_COLUMNS: &str = "id, username, email, role, is_online, last_active, created_at";

/// Row used for login: the user plus the stored hash.
#[derive(sqlx::FromRow)]
struct UserWithHash {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM konvy.users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user by exact username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM konvy.users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user and their password hash by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHash>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM konvy.users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| (r.user, r.password_hash)))
    }

    /// Create a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username or email is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        username: &Username,
        email: &Email,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(&format!(
            r"
            INSERT INTO konvy.users (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                let what = if db_err.constraint() == Some("users_email_key") {
                    "email already exists"
                } else {
                    "username already exists"
                };
                return RepositoryError::Conflict(what.to_owned());
            }
            RepositoryError::Database(e)
        })
    }

    /// Create the owner account if no account holds `username`, otherwise
    /// refresh the stored hash of an existing owner account.
    ///
    /// Returns whatever account holds the username afterwards; callers must
    /// check its role, since a customer may already own the name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ensure_owner(
        &self,
        username: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let upserted = sqlx::query_as::<_, User>(&format!(
            r"
            INSERT INTO konvy.users (username, email, password_hash, role)
            VALUES ($1, $2, $3, 'owner')
            ON CONFLICT (username) DO UPDATE
                SET password_hash = EXCLUDED.password_hash, updated_at = NOW()
                WHERE konvy.users.role = 'owner'
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_optional(self.pool)
        .await?;

        match upserted {
            Some(user) => Ok(user),
            None => self
                .get_by_username(username)
                .await?
                .ok_or(RepositoryError::NotFound),
        }
    }

    /// Record a login or logout.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_online(&self, id: UserId, online: bool) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE konvy.users
            SET is_online = $2, last_active = NOW(), updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(online)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Mark the user as active now.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn touch(&self, id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE konvy.users SET last_active = NOW(), is_online = TRUE WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// List every non-owner account, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_customers(&self) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(&format!(
            r"
            SELECT {USER_COLUMNS}
            FROM konvy.users
            WHERE role <> 'owner'
            ORDER BY created_at DESC, id DESC
            "
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(users)
    }
}
