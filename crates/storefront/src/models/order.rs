//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use konvy_core::{OrderCode, OrderId, OrderStatus, UserId};

/// A redeemable order.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub order_code: OrderCode,
    pub product_name: String,
    pub description: String,
    pub price: Decimal,
    pub status: OrderStatus,
    /// Admin who issued the code; `None` for customer-submitted orders.
    pub created_by: Option<UserId>,
    /// Customer who redeemed the code.
    pub owner_id: Option<UserId>,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order with its display label, as sent to dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    /// "Pending Redemption", "Redeemed" or "Cancelled".
    pub status_label: &'static str,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            status_label: order.status.label(),
            order,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use konvy_core::OrderCode;

    use super::*;

    fn order(created_by: Option<UserId>) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::new(3),
            order_code: OrderCode::parse("ab12").unwrap(),
            product_name: "Fortnite Account".to_string(),
            description: String::new(),
            price: Decimal::ZERO,
            status: OrderStatus::Completed,
            created_by,
            owner_id: Some(UserId::new(9)),
            redeemed_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_view_serializes_label_and_code() {
        let json = serde_json::to_value(OrderView::from(order(None))).unwrap();
        assert_eq!(json["order_code"], "AB12");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["status_label"], "Redeemed");
        assert_eq!(json["price"], "0");
    }
}
