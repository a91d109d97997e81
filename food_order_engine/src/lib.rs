//! Food Order Engine
//!
//! The engine holds the two pieces of the food ordering backend that carry real business rules:
//!
//! 1. The order lifecycle ([`OrderLifecycleApi`]). Recurring passes cancel orders that sat too long in `Pending` or
//!    in `ReadyForDelivery` without a delivery person, complete delivered orders (settling cash-on-delivery payments)
//!    and fail online payments that timed out. Every pass commits its changes and the matching user notifications in
//!    one transaction, then pushes real-time messages on a best-effort basis.
//! 2. The voucher engine ([`VoucherApi`]). It lists the vouchers a user may redeem, validates a code against an order
//!    at checkout, computes discounts, re-checks order-level conditions once the order exists, and provides the admin
//!    write side for vouchers.
//!
//! Both APIs are generic over the backend traits in [`traits`]. [`SqliteDatabase`] implements them on SQLite.
//!
//! The engine also provides a set of events that can be subscribed to ([`events`]). Real-time pushes are published as
//! events, so the transport that delivers them to connected clients lives outside the engine.
pub mod clock;
pub mod db_types;
pub mod events;
pub mod traits;

mod fos_api;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use clock::{Clock, LocalTimezone, SystemClock};
pub use fos_api::{
    conditions,
    errors::{LifecycleApiError, VoucherAdminError},
    lifecycle_objects::{LifecyclePolicy, LifecycleTask, PassReport},
    order_lifecycle_api::OrderLifecycleApi,
    voucher_api::{VoucherApi, VOUCHER_CODE_LENGTH},
    voucher_objects,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
pub use traits::{
    LifecycleDbError,
    NotificationSink,
    NotifierError,
    OrderLifecycleDatabase,
    VoucherDbError,
    VoucherManagement,
};
