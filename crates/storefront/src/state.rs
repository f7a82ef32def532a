//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::{AdminCredentials, AuthError, TrackingClient, TrackingError};
use crate::shopify::{ShopifyError, StorefrontClient};

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("shopify client: {0}")]
    Shopify(#[from] ShopifyError),
    #[error("tracking client: {0}")]
    Tracking(#[from] TrackingError),
    #[error("admin credentials: {0}")]
    Admin(#[from] AuthError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    storefront: Option<StorefrontClient>,
    tracking: TrackingClient,
    admin: AdminCredentials,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The Shopify client is only built when store credentials are
    /// configured; without them the proxy endpoints fail closed.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built or the admin
    /// password cannot be hashed.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let storefront = config
            .shopify
            .as_ref()
            .map(StorefrontClient::new)
            .transpose()?;
        let tracking = TrackingClient::new(config.tracking.clone())?;
        let admin = AdminCredentials::from_config(&config.admin)?;

        if storefront.is_none() {
            tracing::warn!("Shopify credentials not configured; catalog and checkout are disabled");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                storefront,
                tracking,
                admin,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// The Shopify Storefront API client, if credentials are configured.
    #[must_use]
    pub fn storefront(&self) -> Option<&StorefrontClient> {
        self.inner.storefront.as_ref()
    }

    #[must_use]
    pub fn tracking(&self) -> &TrackingClient {
        &self.inner.tracking
    }

    /// Owner login material.
    #[must_use]
    pub fn admin(&self) -> &AdminCredentials {
        &self.inner.admin
    }
}
