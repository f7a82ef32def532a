//! Domain models for the storefront.
//!
//! Row types double as domain types: every column maps onto a core type
//! with a `sqlx` encoding, so repositories decode straight into these.

pub mod chat;
pub mod order;
pub mod session;
pub mod user;

pub use chat::{Conversation, Message};
pub use order::{Order, OrderView};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
