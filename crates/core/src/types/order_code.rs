//! Redeemable order codes.
//!
//! Codes are compared case-insensitively by normalizing them: surrounding
//! whitespace is trimmed and letters are upper-cased before storage, so the
//! unique index on the stored form is the only uniqueness check needed.

use core::fmt;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

/// Characters used by [`OrderCode::generate`].
pub const GENERATED_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a generated code.
pub const GENERATED_LEN: usize = 8;

/// Errors that can occur when parsing an [`OrderCode`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderCodeError {
    #[error("Please enter an order ID")]
    Empty,
    #[error("Order ID must be at most {max} characters")]
    TooLong { max: usize },
}

/// A normalized (trimmed, upper-case) order code.
///
/// ```
/// use konvy_core::OrderCode;
///
/// let code = OrderCode::parse("  ab12cd ").unwrap();
/// assert_eq!(code.as_str(), "AB12CD");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct OrderCode(String);

impl OrderCode {
    /// Maximum length of a stored code.
    pub const MAX_LENGTH: usize = 64;

    /// Normalize and validate a user-supplied code.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is blank or longer than
    /// [`Self::MAX_LENGTH`] characters.
    pub fn parse(s: &str) -> Result<Self, OrderCodeError> {
        let normalized = s.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(OrderCodeError::Empty);
        }
        if normalized.chars().count() > Self::MAX_LENGTH {
            return Err(OrderCodeError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(normalized))
    }

    /// Generate a random 8-character code from `[A-Z0-9]`.
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::rng())
    }

    /// Generate a code from the given RNG.
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..GENERATED_LEN)
            .filter_map(|_| GENERATED_ALPHABET.choose(rng))
            .map(|&b| char::from(b))
            .collect();
        Self(code)
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

impl fmt::Display for OrderCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for OrderCode {
    type Err = OrderCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for OrderCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for OrderCode {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for OrderCode {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Stored codes were normalized on the way in
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for OrderCode {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
