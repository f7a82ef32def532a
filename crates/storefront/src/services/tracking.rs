//! Best-effort activity tracking.
//!
//! Registration and redemption events are posted as form submissions to
//! externally configured endpoints. Delivery happens on a spawned task; the
//! request that triggered it never waits for it and never fails because of it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::task::JoinHandle;
use url::Url;

use konvy_core::{Email, OrderCode, UserId, UserRole};

use crate::config::TrackingConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when building the tracking client.
#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// An event reported to a tracking endpoint.
#[derive(Debug, Clone)]
pub enum TrackingEvent {
    Registration {
        username: String,
        user_id: UserId,
        email: Email,
        role: UserRole,
        registration_date: DateTime<Utc>,
    },
    Redemption {
        username: String,
        user_email: Email,
        order_id: OrderCode,
        redemption_date: DateTime<Utc>,
    },
}

impl TrackingEvent {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Registration { .. } => "registration",
            Self::Redemption { .. } => "redemption",
        }
    }

    /// Form fields submitted for this event.
    #[must_use]
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Registration {
                username,
                user_id,
                email,
                role,
                registration_date,
            } => vec![
                ("username", username.clone()),
                ("user_id", user_id.to_string()),
                ("email", email.to_string()),
                ("role", role.to_string()),
                ("registration_date", registration_date.to_rfc3339()),
                ("status", "registered".to_string()),
            ],
            Self::Redemption {
                username,
                user_email,
                order_id,
                redemption_date,
            } => vec![
                ("username", username.clone()),
                ("user_email", user_email.to_string()),
                ("order_id", order_id.to_string()),
                ("redemption_date", redemption_date.to_rfc3339()),
                ("status", "redeemed".to_string()),
            ],
        }
    }
}

/// Fire-and-forget tracking client.
#[derive(Clone)]
pub struct TrackingClient {
    inner: Arc<TrackingClientInner>,
}

struct TrackingClientInner {
    client: reqwest::Client,
    config: TrackingConfig,
}

impl TrackingClient {
    /// Create a tracking client.
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::Http` if the HTTP client cannot be built.
    pub fn new(config: TrackingConfig) -> Result<Self, TrackingError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(TrackingClientInner { client, config }),
        })
    }

    fn endpoint(&self, event: &TrackingEvent) -> Option<&Url> {
        match event {
            TrackingEvent::Registration { .. } => self.inner.config.registration_url.as_ref(),
            TrackingEvent::Redemption { .. } => self.inner.config.redemption_url.as_ref(),
        }
    }

    /// Post `event` in the background.
    ///
    /// Returns `None` when no endpoint is configured for this kind of event.
    /// Delivery failures are logged and dropped.
    pub fn dispatch(&self, event: TrackingEvent) -> Option<JoinHandle<()>> {
        let Some(url) = self.endpoint(&event).cloned() else {
            tracing::debug!(kind = event.kind(), "No tracking endpoint configured");
            return None;
        };

        let client = self.inner.client.clone();
        Some(tokio::spawn(async move {
            let kind = event.kind();
            match client.post(url).form(&event.form_fields()).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(kind, "Tracking event delivered");
                }
                Ok(response) => {
                    tracing::warn!(kind, status = %response.status(), "Tracking endpoint rejected event");
                }
                Err(e) => {
                    tracing::warn!(kind, error = %e, "Failed to deliver tracking event");
                }
            }
        }))
    }
}
