//! # Food order engine public API
//!
//! The `fos_api` module exposes the programmatic API of the engine. Each API is generic over the backend traits it
//! needs, so clients pick only the functionality they use.
//!
//! * [`order_lifecycle_api`] runs the recurring order lifecycle passes: auto-cancelling stale pending and
//!   ready-for-delivery orders, auto-completing delivered orders and failing timed-out payments.
//! * [`voucher_api`] is the voucher engine: eligibility listing, checkout validation, discount calculation, order-level
//!   condition checks and the admin write side.
//!
//! # API usage
//!
//! An API instance is created by supplying a backend that implements the required traits:
//!
//! ```rust,ignore
//! use food_order_engine::{SqliteDatabase, VoucherApi};
//! let db = SqliteDatabase::new_with_url("sqlite://data/food_orders.db", 5).await?;
//! let api = VoucherApi::new(db);
//! let verdict = api.validate_for_order("SAVE10", user_id, total, restaurant_id, &product_ids).await;
//! ```

pub mod conditions;
pub mod errors;
pub mod lifecycle_objects;
pub mod order_lifecycle_api;
pub mod voucher_api;
pub mod voucher_objects;
