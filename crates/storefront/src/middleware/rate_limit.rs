//! Per-IP throttling of the credential endpoints.
//!
//! Login, registration and the owner login share one limiter keyed on the
//! client address. Throttled callers get the same JSON error shape as every
//! other API failure.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::Json;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use crate::config::AuthRateLimitConfig;

const TOO_MANY_ATTEMPTS: &str = "Too many attempts, please try again later";

/// Proxy headers consulted for the client address, in order.
const CLIENT_IP_HEADERS: [&str; 3] = ["fly-client-ip", "x-real-ip", "x-forwarded-for"];

/// Key extractor that prefers proxy headers and falls back to the peer address.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        client_ip_from_headers(req.headers())
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// First parseable client IP among the proxy headers.
///
/// For `X-Forwarded-For` only the left-most entry is used.
fn client_ip_from_headers(headers: &HeaderMap) -> Option<IpAddr> {
    CLIENT_IP_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    })
}

pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Limiter for the credential endpoints.
///
/// `limit.burst` attempts go through back to back, then one more every
/// `limit.replenish_secs` seconds.
///
/// # Panics
///
/// Never: both quota values are `NonZero`.
#[must_use]
pub fn auth_rate_limiter(limit: &AuthRateLimitConfig) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(limit.replenish_secs.get())
        .burst_size(limit.burst.get())
        .finish()
        .expect("non-zero quota");
    GovernorLayer::new(Arc::new(config)).error_handler(rate_limit_response)
}

/// Render a limiter refusal as `{ "error": ... }`, keeping the retry headers.
fn rate_limit_response(error: GovernorError) -> Response {
    match error {
        GovernorError::TooManyRequests { wait_time, headers } => {
            tracing::debug!(wait_time, "Credential attempt throttled");
            (
                StatusCode::TOO_MANY_REQUESTS,
                headers.unwrap_or_default(),
                Json(serde_json::json!({ "error": TOO_MANY_ATTEMPTS })),
            )
                .into_response()
        }
        other => {
            tracing::warn!(error = %other, "Rate limiter failed");
            Response::from(other)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn request(headers: &[(&str, &str)]) -> Request<()> {
        let mut builder = Request::builder().uri("/api/auth/login");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_fly_header_wins() {
        let req = request(&[
            ("x-forwarded-for", "10.0.0.1, 10.0.0.2"),
            ("fly-client-ip", "203.0.113.7"),
        ]);
        assert_eq!(
            ClientIpKeyExtractor.extract(&req).unwrap(),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_forwarded_for_uses_first_hop() {
        let req = request(&[("x-forwarded-for", " 198.51.100.4 , 10.0.0.2")]);
        assert_eq!(
            ClientIpKeyExtractor.extract(&req).unwrap(),
            "198.51.100.4".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let mut req = request(&[("x-real-ip", "not-an-ip")]);
        req.extensions_mut()
            .insert(ConnectInfo("192.0.2.9:5123".parse::<SocketAddr>().unwrap()));
        assert_eq!(
            ClientIpKeyExtractor.extract(&req).unwrap(),
            "192.0.2.9".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_no_address_is_an_error() {
        assert!(ClientIpKeyExtractor.extract(&request(&[])).is_err());
    }

    #[tokio::test]
    async fn test_throttled_response_is_json() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", "6".parse().unwrap());

        let response = rate_limit_response(GovernorError::TooManyRequests {
            wait_time: 6,
            headers: Some(headers),
        });

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["retry-after"], "6");
        assert_eq!(response.headers()["content-type"], "application/json");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], TOO_MANY_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_limiter_throttles_after_burst() {
        use axum::{Router, body::Body, routing::post};
        use tower::ServiceExt;

        let limit = AuthRateLimitConfig {
            burst: std::num::NonZeroU32::new(2).unwrap(),
            replenish_secs: std::num::NonZeroU64::new(60).unwrap(),
        };
        let app = Router::new()
            .route("/api/auth/login", post(|| async { "ok" }))
            .layer(auth_rate_limiter(&limit));

        let attempt = |ip: &'static str| {
            Request::post("/api/auth/login")
                .header("x-forwarded-for", ip)
                .body(Body::empty())
                .unwrap()
        };

        for _ in 0..2 {
            let response = app.clone().oneshot(attempt("203.0.113.1")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = app.clone().oneshot(attempt("203.0.113.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let response = app.oneshot(attempt("203.0.113.2")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
