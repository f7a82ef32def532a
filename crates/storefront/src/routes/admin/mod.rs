//! Owner dashboard API.
//!
//! Every handler takes [`RequireOwner`](crate::middleware::RequireOwner), so
//! customers get a 403 and anonymous requests a 401.

pub mod chat;
pub mod orders;
pub mod users;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the admin routes router (mounted at `/api/admin`).
///
/// `/login` is mounted separately with the auth rate limiter.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(orders::index).post(orders::create))
        .route("/orders/generate-code", get(orders::generate_code))
        .route("/orders/{id}/complete", post(orders::complete))
        .route("/orders/{id}/cancel", post(orders::cancel))
        .route("/users", get(users::index))
        .route("/conversations", get(chat::conversations))
        .route(
            "/conversations/{id}/messages",
            get(chat::messages).post(chat::send_message),
        )
}
