//! Typed row identifiers.
//!
//! Every table uses a `SERIAL` primary key. Each gets its own wrapper so an
//! order id can never be passed where a user id is expected.

/// Define an `i32`-backed row identifier.
///
/// The generated type serializes as a bare number and, with the `postgres`
/// feature, binds and decodes as `INT4`.
///
/// ```rust
/// # use konvy_core::define_id;
/// define_id!(TicketId);
///
/// let id: TicketId = "17".parse().unwrap();
/// assert_eq!(id.as_i32(), 17);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type), sqlx(transparent))]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i32(self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(UserId);
define_id!(OrderId);
define_id!(ConversationId);
define_id!(MessageId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&OrderId::new(42)).unwrap(), "42");
        let id: UserId = serde_json::from_str("9").unwrap();
        assert_eq!(id, UserId::new(9));
    }

    #[test]
    fn test_parse_and_display() {
        let id: ConversationId = " 7 ".parse().unwrap();
        assert_eq!(i32::from(id), 7);
        assert_eq!(id.to_string(), "7");
        assert!("seven".parse::<ConversationId>().is_err());
    }

    #[test]
    fn test_ordering_follows_value() {
        assert!(MessageId::new(3) < MessageId::new(10));
    }
}
