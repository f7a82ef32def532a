//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Customer registration/login and owner login
//! - `orders` - Code redemption, issuing and fulfillment
//! - `chat` - Support conversations with presence
//! - `tracking` - Fire-and-forget activity notifications

pub mod auth;
pub mod chat;
pub mod orders;
pub mod tracking;

pub use auth::{AdminCredentials, AuthError, AuthService};
pub use chat::{ChatError, ChatService, ConversationView, Thread};
pub use orders::{OrderError, OrderService};
pub use tracking::{TrackingClient, TrackingError, TrackingEvent};
