//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                   - Liveness
//! GET  /health/ready                             - Readiness (database ping)
//!
//! # Proxies (CORS enabled, OPTIONS answers "ok")
//! POST /functions/v1/get-product-details         - Product list or detail
//! POST /functions/v1/shopify-checkout            - Create cart, return checkout URL
//!
//! # Auth (login/register rate limited)
//! POST /api/auth/register                        - Create customer account
//! POST /api/auth/login                           - Username/password login
//! POST /api/auth/logout                          - Logout
//! GET  /api/auth/me                              - Current account
//! POST /api/admin/login                          - Owner login
//!
//! # Customer dashboard (requires a customer login)
//! GET  /api/dashboard/orders                     - Redeemed orders
//! POST /api/dashboard/redeem                     - Redeem an order code
//! GET  /api/dashboard/chat                       - Support thread
//! POST /api/dashboard/chat/messages              - Message the owner
//!
//! # Admin dashboard (requires owner)
//! GET  /api/admin/orders                         - All orders
//! POST /api/admin/orders                         - Issue an order code
//! GET  /api/admin/orders/generate-code           - Random code suggestion
//! POST /api/admin/orders/{id}/complete           - Fulfill
//! POST /api/admin/orders/{id}/cancel             - Cancel
//! GET  /api/admin/users                          - Customers with presence
//! GET  /api/admin/conversations                  - Support conversations
//! GET  /api/admin/conversations/{id}/messages    - Open a conversation
//! POST /api/admin/conversations/{id}/messages    - Reply
//! ```

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod functions;

use axum::{
    Router,
    routing::{get, post},
};

use crate::config::AuthRateLimitConfig;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes(limit: &AuthRateLimitConfig) -> Router<AppState> {
    let limited = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/admin/login", post(auth::admin_login))
        .layer(auth_rate_limiter(limit));

    Router::new()
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .merge(limited)
}

/// Create the customer dashboard routes router.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(dashboard::orders))
        .route("/redeem", post(dashboard::redeem))
        .route("/chat", get(dashboard::chat))
        .route("/chat/messages", post(dashboard::send_message))
}

/// Create all routes for the storefront.
pub fn routes(auth_limit: &AuthRateLimitConfig) -> Router<AppState> {
    Router::new()
        .nest("/functions/v1", functions::function_routes())
        .merge(auth_routes(auth_limit))
        .nest("/api/dashboard", dashboard_routes())
        .nest("/api/admin", admin::admin_routes())
}
