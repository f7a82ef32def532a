//! Konvy Core - Shared domain types.
//!
//! This crate provides the types shared by the Konvy components:
//! - `storefront` - HTTP server (catalog proxies, dashboards, auth)
//! - `cli` - Command-line tools for migrations and order management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Database encodings are available behind the
//! `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - IDs, order codes, statuses, presence and credential checks

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
