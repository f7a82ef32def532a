//! Order repository for database operations.
//!
//! Every state change is a single conditional statement, so concurrent
//! redemptions of one code cannot both succeed: the unique index decides
//! inserts and `WHERE owner_id IS NULL` / `WHERE status = ...` decide updates.

use rust_decimal::Decimal;
use sqlx::PgPool;

use konvy_core::{OrderCode, OrderId, OrderStatus, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::Order;

const ORDER_COLUMNS: &str = "id, order_code, product_name, description, price, status, \
                             created_by, owner_id, redeemed_at, created_at, updated_at";

/// Parameters for inserting an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_code: OrderCode,
    pub product_name: String,
    pub description: String,
    pub price: Decimal,
    /// Issuing admin; `None` for customer-submitted orders.
    pub created_by: Option<UserId>,
    /// Redeeming customer, when the order is created by a redemption.
    pub owner_id: Option<UserId>,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM konvy.orders ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Orders redeemed by one customer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_owner(&self, owner: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM konvy.orders
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(owner)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Look up an order by normalized code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(&self, code: &OrderCode) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM konvy.orders WHERE order_code = $1"
        ))
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Insert an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code already exists; nothing
    /// is written in that case.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        sqlx::query_as::<_, Order>(&format!(
            r"
            INSERT INTO konvy.orders
                (order_code, product_name, description, price, status,
                 created_by, owner_id, redeemed_at)
            VALUES ($1, $2, $3, $4, 'pending', $5, $6,
                    CASE WHEN $6::INTEGER IS NULL THEN NULL ELSE NOW() END)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(&order.order_code)
        .bind(&order.product_name)
        .bind(&order.description)
        .bind(order.price)
        .bind(order.created_by)
        .bind(order.owner_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "order code already exists"))
    }

    /// Attach an unclaimed pending order to `owner`.
    ///
    /// Returns `None` if no such order exists or it was already claimed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn claim(
        &self,
        code: &OrderCode,
        owner: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            UPDATE konvy.orders
            SET owner_id = $2, redeemed_at = NOW(), updated_at = NOW()
            WHERE order_code = $1 AND owner_id IS NULL AND status = 'pending'
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(code)
        .bind(owner)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Move an order from `from` to `to`.
    ///
    /// Returns `None` if the order does not exist or is no longer in `from`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn transition(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            UPDATE konvy.orders
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Whether an order with this ID exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM konvy.orders WHERE id = $1)")
                .bind(id)
                .fetch_one(self.pool)
                .await?;

        Ok(exists)
    }
}
