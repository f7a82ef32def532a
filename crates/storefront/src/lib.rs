//! Konvy storefront library.
//!
//! Everything the server binary runs, exposed as a library so the CLI can
//! reuse the services and repositories.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
pub mod telemetry;
