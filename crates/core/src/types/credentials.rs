//! Username and password checks applied before any account lookup.
//!
//! Both registration and login run these checks, so a malformed request is
//! rejected without touching storage.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Minimum username length, in characters.
pub const MIN_USERNAME_LEN: usize = 2;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// A credential check failed. The messages are shown to the user verbatim.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Username must be at least 2 characters")]
    UsernameTooShort,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// A trimmed username of at least [`MIN_USERNAME_LEN`] characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Parse a username, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::UsernameTooShort`] if fewer than two
    /// characters remain.
    pub fn parse(s: &str) -> Result<Self, CredentialError> {
        let s = s.trim();
        if s.chars().count() < MIN_USERNAME_LEN {
            return Err(CredentialError::UsernameTooShort);
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Check the password length.
///
/// # Errors
///
/// Returns [`CredentialError::PasswordTooShort`] below [`MIN_PASSWORD_LEN`].
pub fn check_password(password: &str) -> Result<(), CredentialError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CredentialError::PasswordTooShort);
    }
    Ok(())
}

/// Validate a login attempt.
///
/// # Errors
///
/// Returns the first failing check: username length, then password length.
pub fn check_login(username: &str, password: &str) -> Result<Username, CredentialError> {
    let username = Username::parse(username)?;
    check_password(password)?;
    Ok(username)
}

/// Validate a registration form.
///
/// # Errors
///
/// Returns the first failing check: username length, password length, then
/// confirmation mismatch.
pub fn check_registration(
    username: &str,
    password: &str,
    confirm_password: &str,
) -> Result<Username, CredentialError> {
    let username = check_login(username, password)?;
    if password != confirm_password {
        return Err(CredentialError::PasswordMismatch);
    }
    Ok(username)
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Username {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Username {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
