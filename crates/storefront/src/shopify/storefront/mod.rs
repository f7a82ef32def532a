//! Shopify Storefront API client implementation.
//!
//! Uses `graphql_client` query bodies with `reqwest` 0.13 for HTTP. Every
//! call goes to Shopify; nothing is cached and failed calls are not retried.

mod conversions;
pub mod queries;

use std::sync::Arc;
use std::time::Duration;

use graphql_client::{GraphQLQuery, Response};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::types::{Cart, ProductDetail, ProductSummary};
use crate::shopify::ShopifyError;

use conversions::{
    convert_cart, convert_product_detail, convert_product_summary, join_user_errors,
};
use queries::{CreateCart, GetProduct, GetProducts, create_cart, get_product, get_products};

/// Header carrying the Storefront API access token.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";

/// Upper bound for `products(first:)` accepted by Shopify.
pub const MAX_PAGE_SIZE: i64 = 250;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Cheap to clone; the HTTP connection pool is shared.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ShopifyStorefrontConfig) -> Result<Self, ShopifyError> {
        let endpoint = format!(
            "https://{}/api/{}/graphql.json",
            config.store, config.api_version
        );

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(StorefrontClientInner {
                client,
                endpoint,
                access_token: config.access_token.clone(),
            }),
        })
    }

    /// Send one operation and decode its `data`.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header(ACCESS_TOKEN_HEADER, self.inner.access_token.expose_secret())
            .json(&Q::build_query(variables))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ShopifyError::RateLimited(retry_after(response.headers())));
        }

        let body = response.text().await?;
        decode::<Q::ResponseData>(status, &body).inspect_err(|e| {
            tracing::error!(
                %status,
                error = %e,
                body = %snippet(&body, 500),
                "Shopify request failed"
            );
        })
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List up to `limit` products (clamped to `1..=250`).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, limit: i64) -> Result<Vec<ProductSummary>, ShopifyError> {
        let variables = get_products::Variables {
            first: limit.clamp(1, MAX_PAGE_SIZE),
        };

        let data = self.execute::<GetProducts>(variables).await?;

        Ok(data
            .products
            .into_nodes()
            .map(convert_product_summary)
            .collect())
    }

    /// Get a product by its global ID.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if no product has this ID, or an
    /// error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &str) -> Result<ProductDetail, ShopifyError> {
        let variables = get_product::Variables { id: id.to_string() };

        let data = self.execute::<GetProduct>(variables).await?;

        data.product
            .map(convert_product_detail)
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {id}")))
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Create a new single-line cart for the hosted checkout.
    ///
    /// Not idempotent: every call creates a new cart.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserError` if Shopify rejects the input, or an
    /// error if the API request fails.
    #[instrument(skip(self), fields(variant_id = %variant_id))]
    pub async fn create_checkout(
        &self,
        variant_id: &str,
        quantity: i64,
    ) -> Result<Cart, ShopifyError> {
        let variables = create_cart::Variables {
            input: create_cart::CartInput {
                lines: vec![create_cart::CartLineInput {
                    merchandise_id: variant_id.to_string(),
                    quantity,
                }],
            },
        };

        let data = self.execute::<CreateCart>(variables).await?;

        if let Some(result) = data.cart_create {
            if !result.user_errors.is_empty() {
                return Err(ShopifyError::UserError(join_user_errors(
                    &result.user_errors,
                )));
            }

            if let Some(cart) = result.cart {
                return Ok(convert_cart(cart));
            }
        }

        Err(ShopifyError::message("Failed to create cart"))
    }
}

fn retry_after(headers: &reqwest::header::HeaderMap) -> u64 {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(1)
}

fn snippet(body: &str, max: usize) -> String {
    body.chars().take(max).collect()
}

/// Turn a raw Storefront API reply into its `data`.
///
/// Non-2xx statuses and a non-empty `errors` array are both failures, as is
/// a reply carrying neither data nor errors.
fn decode<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ShopifyError> {
    if !status.is_success() {
        return Err(ShopifyError::message(format!(
            "HTTP {status}: {}",
            snippet(body, 200)
        )));
    }

    let response: Response<T> = serde_json::from_str(body)?;

    if let Some(errors) = response.errors.filter(|e| !e.is_empty()) {
        debug!(count = errors.len(), "GraphQL errors in response");
        return Err(ShopifyError::GraphQL(
            errors.into_iter().map(Into::into).collect(),
        ));
    }

    response
        .data
        .ok_or_else(|| ShopifyError::message("No data in response"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Data {
        shop: String,
    }

    #[test]
    fn test_decode_data() {
        let data: Data = decode(StatusCode::OK, r#"{"data": {"shop": "konvy"}}"#).unwrap();
        assert_eq!(data.shop, "konvy");
    }

    #[test]
    fn test_decode_graphql_errors() {
        let err = decode::<Data>(
            StatusCode::OK,
            r#"{"data": null, "errors": [{"message": "Throttled", "path": ["products"]}]}"#,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "GraphQL errors: Throttled (at products)");
    }

    #[test]
    fn test_decode_status_and_empty_replies() {
        let err = decode::<Data>(StatusCode::UNAUTHORIZED, "bad token").unwrap_err();
        assert_eq!(err.to_string(), "GraphQL errors: HTTP 401 Unauthorized: bad token");

        let err = decode::<Data>(StatusCode::OK, r#"{"data": null}"#).unwrap_err();
        assert_eq!(err.to_string(), "GraphQL errors: No data in response");

        let err = decode::<Data>(StatusCode::OK, "<html>").unwrap_err();
        assert!(matches!(err, ShopifyError::Parse(_)));
    }

    #[test]
    fn test_retry_after_defaults_to_one_second() {
        let mut headers = reqwest::header::HeaderMap::new();
        assert_eq!(retry_after(&headers), 1);

        headers.insert(reqwest::header::RETRY_AFTER, "4".parse().unwrap());
        assert_eq!(retry_after(&headers), 4);
    }
}
