//! Catalog and checkout proxies.
//!
//! Browser-facing JSON endpoints that keep the Storefront API token on the
//! server. Every response carries permissive CORS headers; failures are
//! `500 { error }` except an unknown product, which is a 404.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use thiserror::Error;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::shopify::{ShopifyError, StorefrontClient};
use crate::state::AppState;

/// Products returned in list mode when no limit is given.
pub const DEFAULT_PRODUCT_LIMIT: i64 = 12;

const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

/// Errors surfaced by the proxy endpoints.
#[derive(Debug, Error)]
pub enum FunctionError {
    #[error("Shopify credentials not configured")]
    NotConfigured,

    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("variantId is required")]
    MissingVariant,

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error(transparent)]
    Shopify(#[from] ShopifyError),
}

impl FunctionError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Shopify(ShopifyError::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Shopify(ShopifyError::NotFound(_)) => "Product not found".to_string(),
            Self::Shopify(ShopifyError::UserError(msg)) => format!("Cart creation error: {msg}"),
            Self::Shopify(_) => "Shopify API error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for FunctionError {
    fn into_response(self) -> Response {
        if matches!(&self, Self::Shopify(e) if !e.is_user_error() && !matches!(e, ShopifyError::NotFound(_)))
        {
            let event_id = sentry::capture_error(&self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "Shopify proxy error");
        } else {
            tracing::warn!(error = %self, "Proxy request rejected");
        }

        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

/// `POST /functions/v1/get-product-details` body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailsRequest {
    pub limit: Option<i64>,
    pub product_id: Option<String>,
}

impl ProductDetailsRequest {
    /// Product ID for detail mode; blank IDs select list mode.
    fn product_id(&self) -> Option<&str> {
        self.product_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// `POST /functions/v1/shopify-checkout` body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub variant_id: Option<String>,
    pub quantity: Option<i64>,
}

impl CheckoutRequest {
    fn validate(&self) -> Result<(&str, i64), FunctionError> {
        let variant_id = self
            .variant_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(FunctionError::MissingVariant)?;

        let quantity = self.quantity.unwrap_or(1);
        if quantity < 1 {
            return Err(FunctionError::InvalidQuantity);
        }

        Ok((variant_id, quantity))
    }
}

/// Parse a JSON body; an empty body means "all defaults".
fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, FunctionError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    Ok(serde_json::from_slice(body)?)
}

fn storefront(state: &AppState) -> Result<&StorefrontClient, FunctionError> {
    state.storefront().ok_or(FunctionError::NotConfigured)
}

/// List products, or fetch one product when `productId` is given.
///
/// POST /functions/v1/get-product-details
///
/// # Errors
///
/// Returns `FunctionError` if credentials are missing, the body is invalid,
/// or the Shopify call fails.
pub async fn get_product_details(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, FunctionError> {
    let request: ProductDetailsRequest = parse_body(&body)?;
    let client = storefront(&state)?;

    if let Some(id) = request.product_id() {
        let product = client.get_product(id).await?;
        return Ok(Json(product).into_response());
    }

    let products = client
        .list_products(request.limit.unwrap_or(DEFAULT_PRODUCT_LIMIT))
        .await?;
    Ok(Json(json!({ "products": products })).into_response())
}

/// Create a one-line cart and return its hosted checkout URL.
///
/// POST /functions/v1/shopify-checkout
///
/// # Errors
///
/// Returns `FunctionError` if credentials are missing, the body is invalid,
/// or Shopify rejects the cart.
pub async fn shopify_checkout(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, FunctionError> {
    let request: CheckoutRequest = parse_body(&body)?;
    let (variant_id, quantity) = request.validate()?;
    let client = storefront(&state)?;

    let cart = client.create_checkout(variant_id, quantity).await?;
    tracing::info!(cart_id = %cart.id, "Checkout cart created");

    let checkout_url = cart.checkout_url.clone();
    Ok(Json(json!({
        "success": true,
        "cart": cart,
        "checkoutUrl": checkout_url,
    }))
    .into_response())
}

/// CORS preflight.
pub async fn preflight() -> &'static str {
    "ok"
}

/// Create the proxy routes router, with CORS headers on every response.
pub fn function_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/get-product-details",
            post(get_product_details).options(preflight),
        )
        .route("/shopify-checkout", post(shopify_checkout).options(preflight))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("access-control-allow-methods"),
            HeaderValue::from_static("*"),
        ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use super::*;

    #[test]
    fn test_empty_body_uses_defaults() {
        let request: ProductDetailsRequest = parse_body(b"").unwrap();
        assert!(request.limit.is_none());
        assert!(request.product_id().is_none());

        let request: ProductDetailsRequest = parse_body(b"  \n").unwrap();
        assert!(request.product_id().is_none());
    }

    #[test]
    fn test_detail_mode_needs_non_blank_id() {
        let request: ProductDetailsRequest =
            parse_body(br#"{"productId": "gid://shopify/Product/1", "limit": 3}"#).unwrap();
        assert_eq!(request.product_id(), Some("gid://shopify/Product/1"));
        assert_eq!(request.limit, Some(3));

        let request: ProductDetailsRequest = parse_body(br#"{"productId": "  "}"#).unwrap();
        assert!(request.product_id().is_none());
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        let result: Result<ProductDetailsRequest, _> = parse_body(b"{not json");
        assert!(matches!(result, Err(FunctionError::InvalidBody(_))));
    }

    #[test]
    fn test_checkout_quantity_defaults_to_one() {
        let request: CheckoutRequest = parse_body(br#"{"variantId": "v1"}"#).unwrap();
        assert_eq!(request.validate().unwrap(), ("v1", 1));
    }

    #[test]
    fn test_checkout_validation() {
        let request: CheckoutRequest =
            parse_body(br#"{"variantId": "v1", "quantity": 0}"#).unwrap();
        assert!(matches!(
            request.validate(),
            Err(FunctionError::InvalidQuantity)
        ));

        let request: CheckoutRequest = parse_body(b"{}").unwrap();
        assert!(matches!(
            request.validate(),
            Err(FunctionError::MissingVariant)
        ));
    }

    #[test]
    fn test_error_statuses_and_messages() {
        let err = FunctionError::Shopify(ShopifyError::NotFound("Product not found: x".into()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "Product not found");

        let err = FunctionError::NotConfigured;
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Shopify credentials not configured");

        let err = FunctionError::Shopify(ShopifyError::UserError("Quantity is invalid".into()));
        assert_eq!(err.message(), "Cart creation error: Quantity is invalid");

        let err = FunctionError::Shopify(ShopifyError::RateLimited(3));
        assert_eq!(err.message(), "Shopify API error");
    }

    /// The proxy router over a state with no Shopify credentials.
    fn unconfigured_routes() -> Router {
        let config = crate::config::StorefrontConfig::for_tests();
        let pool = sqlx::PgPool::connect_lazy("postgres://localhost/konvy_test").unwrap();
        function_routes().with_state(AppState::new(config, pool).unwrap())
    }

    fn assert_cors(response: &Response) {
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-headers"], ALLOWED_HEADERS);
        assert_eq!(headers["access-control-allow-methods"], "*");
    }

    #[tokio::test]
    async fn test_preflight_carries_cors_headers() {
        for path in ["/get-product-details", "/shopify-checkout"] {
            let response = unconfigured_routes()
                .oneshot(
                    Request::builder()
                        .method("OPTIONS")
                        .uri(path)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            assert_cors(&response);
            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            assert_eq!(&body[..], b"ok");
        }
    }

    #[tokio::test]
    async fn test_unconfigured_catalog_fails_closed_with_cors() {
        let response = unconfigured_routes()
            .oneshot(
                Request::post("/get-product-details")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"limit": 4}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_cors(&response);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({ "error": "Shopify credentials not configured" }));
    }
}
