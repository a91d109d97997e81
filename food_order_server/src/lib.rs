//! # Food order lifecycle server
//! This crate hosts the long-running process that keeps orders moving. It is responsible for:
//! Running one recurring worker per order lifecycle task (see [`food_order_engine::LifecycleTask`]).
//! Publishing the real-time pushes that the lifecycle passes produce.
//! Stopping cleanly on Ctrl+C or SIGTERM.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.

pub mod cli;
pub mod config;
pub mod errors;
pub mod lifecycle_worker;
pub mod server;
pub mod shutdown;
