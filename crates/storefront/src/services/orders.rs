//! Order redemption and fulfillment.

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use konvy_core::{OrderCode, OrderCodeError, OrderId, OrderStatus, UserId};

use crate::config::{RedemptionConfig, RedemptionPolicy};
use crate::db::{NewOrder, OrderRepository, RepositoryError};
use crate::models::Order;

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("{0}")]
    InvalidCode(#[from] OrderCodeError),

    /// Admin form submitted with a blank product name or code.
    #[error("missing required fields")]
    MissingFields,

    /// Admin tried to issue a code that is already stored.
    #[error("order code already exists")]
    CodeAlreadyExists,

    /// The code belongs to a customer already.
    #[error("order code already redeemed")]
    AlreadyRedeemed,

    /// Unknown code under the `issued_only` policy.
    #[error("order code not found")]
    CodeNotFound,

    #[error("order not found")]
    NotFound,

    /// Fulfillment attempted on a completed or cancelled order.
    #[error("order is not pending")]
    NotPending,

    #[error("redemption failed: {0}")]
    RedeemFailed(#[source] RepositoryError),

    #[error("order creation failed: {0}")]
    CreateFailed(#[source] RepositoryError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Order service.
pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
        }
    }

    /// Redeem a code for a customer.
    ///
    /// An unclaimed issued order is claimed. Otherwise, under the
    /// `provisional` policy, a pending order owned by the customer is
    /// recorded; the unique code index turns a lost race or a reused code
    /// into `AlreadyRedeemed`.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::AlreadyRedeemed` if the code has an owner.
    /// Returns `OrderError::CodeNotFound` for unknown codes under `issued_only`.
    /// Returns `OrderError::RedeemFailed` on storage failure.
    #[instrument(skip(self, config), fields(order_code = %code))]
    pub async fn redeem(
        &self,
        customer: UserId,
        code: &OrderCode,
        config: &RedemptionConfig,
    ) -> Result<Order, OrderError> {
        if let Some(order) = self
            .orders
            .claim(code, customer)
            .await
            .map_err(OrderError::RedeemFailed)?
        {
            tracing::info!(order_id = %order.id, "Issued order claimed");
            return Ok(order);
        }

        match config.policy {
            RedemptionPolicy::Provisional => {
                let new_order = NewOrder {
                    order_code: code.clone(),
                    product_name: config.product_name.clone(),
                    description: config.product_description.clone(),
                    price: Decimal::ZERO,
                    created_by: None,
                    owner_id: Some(customer),
                };

                match self.orders.create(&new_order).await {
                    Ok(order) => {
                        tracing::info!(order_id = %order.id, "Provisional order recorded");
                        Ok(order)
                    }
                    Err(RepositoryError::Conflict(_)) => Err(OrderError::AlreadyRedeemed),
                    Err(e) => Err(OrderError::RedeemFailed(e)),
                }
            }
            RedemptionPolicy::IssuedOnly => {
                let existing = self
                    .orders
                    .get_by_code(code)
                    .await
                    .map_err(OrderError::RedeemFailed)?;

                if existing.is_some() {
                    Err(OrderError::AlreadyRedeemed)
                } else {
                    Err(OrderError::CodeNotFound)
                }
            }
        }
    }

    /// Issue a new code from the admin dashboard.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::MissingFields` if either field is blank.
    /// Returns `OrderError::CodeAlreadyExists` if the normalized code is taken.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        admin: UserId,
        product_name: &str,
        order_code: &str,
    ) -> Result<Order, OrderError> {
        let product_name = product_name.trim();
        if product_name.is_empty() || order_code.trim().is_empty() {
            return Err(OrderError::MissingFields);
        }
        let order_code = OrderCode::parse(order_code)?;

        let new_order = NewOrder {
            order_code,
            product_name: product_name.to_string(),
            description: String::new(),
            price: Decimal::ZERO,
            created_by: Some(admin),
            owner_id: None,
        };

        self.orders.create(&new_order).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => OrderError::CodeAlreadyExists,
            other => OrderError::CreateFailed(other),
        })
    }

    /// All orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.list_all().await?)
    }

    /// A customer's redeemed orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the query fails.
    pub async fn list_for(&self, customer: UserId) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.list_for_owner(customer).await?)
    }

    /// Mark a pending order fulfilled.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` or `OrderError::NotPending`.
    pub async fn complete(&self, id: OrderId) -> Result<Order, OrderError> {
        self.transition(id, OrderStatus::Completed).await
    }

    /// Cancel a pending order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` or `OrderError::NotPending`.
    pub async fn cancel(&self, id: OrderId) -> Result<Order, OrderError> {
        self.transition(id, OrderStatus::Cancelled).await
    }

    #[instrument(skip(self))]
    async fn transition(&self, id: OrderId, to: OrderStatus) -> Result<Order, OrderError> {
        let from = OrderStatus::Pending;
        debug_assert!(from.can_transition_to(to));

        if let Some(order) = self.orders.transition(id, from, to).await? {
            tracing::info!(order_id = %order.id, status = %to, "Order status changed");
            return Ok(order);
        }

        if self.orders.exists(id).await? {
            Err(OrderError::NotPending)
        } else {
            Err(OrderError::NotFound)
        }
    }
}
