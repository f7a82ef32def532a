//! Shopify Storefront API client.
//!
//! # Architecture
//!
//! - Query bodies follow `graphql_client`'s `GraphQLQuery` protocol; HTTP goes
//!   through `reqwest` 0.13 directly
//! - Shopify is the source of truth for the catalog; nothing is stored locally
//!   and nothing is cached
//! - Only the Storefront API is used: product listing, product detail and
//!   cart creation for the hosted checkout
//!
//! # Example
//!
//! ```rust,ignore
//! use konvy_storefront::shopify::StorefrontClient;
//!
//! let client = StorefrontClient::new(&shopify_config)?;
//! let products = client.list_products(12).await?;
//! let cart = client.create_checkout(&products[0].variant.as_ref().unwrap().id, 1).await?;
//! println!("{}", cart.checkout_url);
//! ```

mod storefront;
pub mod types;

pub use storefront::{MAX_PAGE_SIZE, StorefrontClient};
pub use types::*;

use core::fmt;

use thiserror::Error;

/// Errors from the Storefront API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// `errors` array in the response, or a non-2xx status.
    #[error("GraphQL errors: {}", join_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    /// 429 from Shopify; carries `Retry-After` in seconds.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// `userErrors` from a mutation, joined into one message.
    #[error("User error: {0}")]
    UserError(String),
}

impl ShopifyError {
    /// A single GraphQL error with no path.
    pub(crate) fn message(message: impl Into<String>) -> Self {
        Self::GraphQL(vec![GraphQLError {
            message: message.into(),
            path: None,
        }])
    }

    /// Whether Shopify rejected the input rather than failing itself.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::UserError(_))
    }
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphQLError {
    pub message: String,
    /// Dotted response path, e.g. `product.variants.0`.
    pub path: Option<String>,
}

impl From<graphql_client::Error> for GraphQLError {
    fn from(e: graphql_client::Error) -> Self {
        let path = e.path.filter(|p| !p.is_empty()).map(|fragments| {
            fragments
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(".")
        });
        Self {
            message: e.message,
            path,
        }
    }
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.message.is_empty(), &self.path) {
            (false, Some(path)) => write!(f, "{} (at {path})", self.message),
            (false, None) => f.write_str(&self.message),
            (true, Some(path)) => write!(f, "(no message) at {path}"),
            (true, None) => f.write_str("(no message)"),
        }
    }
}

fn join_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(none reported)".to_string();
    }
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use graphql_client::PathFragment;

    use super::*;

    #[test]
    fn test_errors_are_joined() {
        let err = ShopifyError::GraphQL(vec![
            GraphQLError {
                message: "Access denied for quantityAvailable".to_string(),
                path: None,
            },
            GraphQLError {
                message: "Invalid global id".to_string(),
                path: Some("product".to_string()),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Access denied for quantityAvailable; Invalid global id (at product)"
        );
        assert_eq!(
            ShopifyError::GraphQL(vec![]).to_string(),
            "GraphQL errors: (none reported)"
        );
    }

    #[test]
    fn test_path_from_client_error() {
        let raw = graphql_client::Error {
            message: String::new(),
            locations: None,
            path: Some(vec![
                PathFragment::Key("product".to_string()),
                PathFragment::Key("variants".to_string()),
                PathFragment::Index(0),
            ]),
            extensions: None,
        };
        let err = GraphQLError::from(raw);
        assert_eq!(err.path.as_deref(), Some("product.variants.0"));
        assert_eq!(err.to_string(), "(no message) at product.variants.0");
    }

    #[test]
    fn test_user_error_classification() {
        assert!(ShopifyError::UserError("Merchandise does not exist".into()).is_user_error());
        assert!(!ShopifyError::RateLimited(2).is_user_error());
        assert!(!ShopifyError::message("boom").is_user_error());
    }
}
