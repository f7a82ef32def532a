//! Order management for the owner.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use konvy_core::{OrderCode, OrderId};

use crate::error::{ApiJson, AppError};
use crate::middleware::RequireOwner;
use crate::models::OrderView;
use crate::services::OrderService;
use crate::state::AppState;

/// Order creation request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub order_code: String,
}

#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<OrderView>,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order: OrderView,
}

#[derive(Debug, Serialize)]
pub struct GeneratedCodeResponse {
    pub code: OrderCode,
}

/// Every order, newest first.
///
/// GET /api/admin/orders
///
/// # Errors
///
/// Returns `AppError` if the query fails.
pub async fn index(
    State(state): State<AppState>,
    RequireOwner(_owner): RequireOwner,
) -> Result<Json<OrdersResponse>, AppError> {
    let orders = OrderService::new(state.pool()).list_all().await?;
    Ok(Json(OrdersResponse {
        orders: orders.into_iter().map(OrderView::from).collect(),
    }))
}

/// Issue a new order code.
///
/// POST /api/admin/orders
///
/// # Errors
///
/// Returns `AppError::Order` if a field is blank or the code already exists.
pub async fn create(
    State(state): State<AppState>,
    RequireOwner(owner): RequireOwner,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = OrderService::new(state.pool())
        .create(owner.id, &req.product_name, &req.order_code)
        .await?;

    tracing::info!(order_id = %order.id, order_code = %order.order_code, "Order issued");
    Ok(Json(OrderResponse {
        order: order.into(),
    }))
}

/// Suggest a random code for the creation form.
///
/// GET /api/admin/orders/generate-code
pub async fn generate_code(RequireOwner(_owner): RequireOwner) -> Json<GeneratedCodeResponse> {
    Json(GeneratedCodeResponse {
        code: OrderCode::generate(),
    })
}

/// Mark a pending order fulfilled.
///
/// POST /api/admin/orders/{id}/complete
///
/// # Errors
///
/// Returns `AppError::Order` if the order is unknown or not pending.
pub async fn complete(
    State(state): State<AppState>,
    RequireOwner(_owner): RequireOwner,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = OrderService::new(state.pool()).complete(id).await?;
    Ok(Json(OrderResponse {
        order: order.into(),
    }))
}

/// Cancel a pending order.
///
/// POST /api/admin/orders/{id}/cancel
///
/// # Errors
///
/// Returns `AppError::Order` if the order is unknown or not pending.
pub async fn cancel(
    State(state): State<AppState>,
    RequireOwner(_owner): RequireOwner,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = OrderService::new(state.pool()).cancel(id).await?;
    Ok(Json(OrderResponse {
        order: order.into(),
    }))
}
