//! Core types for Konvy.
//!
//! This module provides type-safe wrappers for the storefront's domain concepts.

pub mod credentials;
pub mod email;
pub mod id;
pub mod order_code;
pub mod presence;
pub mod status;

pub use credentials::{
    CredentialError, MIN_PASSWORD_LEN, MIN_USERNAME_LEN, Username, check_login, check_password,
    check_registration,
};
pub use email::{Email, EmailError};
pub use id::*;
pub use order_code::{OrderCode, OrderCodeError};
pub use presence::{ONLINE_WINDOW_SECS, Presence, is_online, time_since};
pub use status::*;
