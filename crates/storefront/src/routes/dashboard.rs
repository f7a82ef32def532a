//! Customer dashboard: redeemed orders, code redemption and support chat.

use axum::{Json, extract::State};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use konvy_core::{OrderCode, UserId};

use crate::db::UserRepository;
use crate::error::{ApiJson, AppError, add_breadcrumb};
use crate::middleware::RequireCustomer;
use crate::models::OrderView;
use crate::services::{AuthService, ChatService, OrderError, OrderService, Thread, TrackingEvent};
use crate::state::AppState;

const REDEEM_SUCCESS_MESSAGE: &str =
    "Order submitted successfully! We will process your redemption request.";

/// Redemption request body.
#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub code: String,
}

/// Chat message request body.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<OrderView>,
}

#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    pub success: bool,
    pub message: &'static str,
    pub order: OrderView,
    pub orders: Vec<OrderView>,
}

/// Record dashboard activity. Failures are logged only.
async fn touch_activity(state: &AppState, user_id: UserId) {
    if let Err(e) = UserRepository::new(state.pool()).touch(user_id).await {
        tracing::warn!(user_id = %user_id, error = %e, "Failed to record activity");
    }
}

/// The customer's redeemed orders.
///
/// GET /api/dashboard/orders
///
/// # Errors
///
/// Returns `AppError` if the query fails.
pub async fn orders(
    State(state): State<AppState>,
    RequireCustomer(user): RequireCustomer,
) -> Result<Json<OrdersResponse>, AppError> {
    touch_activity(&state, user.id).await;

    let orders = OrderService::new(state.pool()).list_for(user.id).await?;
    Ok(Json(OrdersResponse {
        orders: orders.into_iter().map(OrderView::from).collect(),
    }))
}

/// Redeem an order code.
///
/// POST /api/dashboard/redeem
///
/// # Errors
///
/// Returns `AppError::Order` for an empty or already-redeemed code, or when
/// storage fails.
pub async fn redeem(
    State(state): State<AppState>,
    RequireCustomer(current): RequireCustomer,
    ApiJson(req): ApiJson<RedeemRequest>,
) -> Result<Json<RedeemResponse>, AppError> {
    let code = OrderCode::parse(&req.code).map_err(OrderError::from)?;
    let user = AuthService::new(state.pool()).get_user(current.id).await?;

    add_breadcrumb("orders", "Redeem order code", &[("order_code", code.as_str())]);

    state.tracking().dispatch(TrackingEvent::Redemption {
        username: user.username.clone(),
        user_email: user.email.clone(),
        order_id: code.clone(),
        redemption_date: Utc::now(),
    });

    let service = OrderService::new(state.pool());
    let order = service
        .redeem(user.id, &code, &state.config().redemption)
        .await?;
    touch_activity(&state, user.id).await;

    let orders = service.list_for(user.id).await?;
    Ok(Json(RedeemResponse {
        success: true,
        message: REDEEM_SUCCESS_MESSAGE,
        order: order.into(),
        orders: orders.into_iter().map(OrderView::from).collect(),
    }))
}

/// Open the customer's support thread, creating it on first visit.
///
/// GET /api/dashboard/chat
///
/// # Errors
///
/// Returns `AppError` if a query fails.
pub async fn chat(
    State(state): State<AppState>,
    RequireCustomer(user): RequireCustomer,
) -> Result<Json<Thread>, AppError> {
    touch_activity(&state, user.id).await;

    let thread = ChatService::new(state.pool())
        .open_customer_thread(&user)
        .await?;
    Ok(Json(thread))
}

/// Send a message to the store owner.
///
/// POST /api/dashboard/chat/messages
///
/// # Errors
///
/// Returns `AppError::Chat` if the message is blank.
pub async fn send_message(
    State(state): State<AppState>,
    RequireCustomer(user): RequireCustomer,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> Result<Json<Thread>, AppError> {
    let thread = ChatService::new(state.pool())
        .send_as_customer(&user, &req.body)
        .await?;
    touch_activity(&state, user.id).await;

    Ok(Json(thread))
}
