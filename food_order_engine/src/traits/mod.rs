//! #  Backend contracts
//!
//! This module defines the interfaces that the order lifecycle workers and the voucher engine need from the outside
//! world. Concrete backends (e.g. `SqliteDatabase`) implement these traits, and the public APIs
//! ([`crate::OrderLifecycleApi`], [`crate::VoucherApi`]) are generic over them.
//!
//! * [`OrderLifecycleDatabase`] fetches orders in batches and commits order transitions together with their
//!   notifications.
//! * [`VoucherManagement`] reads vouchers, users and order counts, and performs the transactional voucher CRUD.
//! * [`NotificationSink`] pushes real-time messages to users and groups of users.
mod data_objects;
mod notification_sink;
mod order_lifecycle_database;
mod voucher_management;

pub use data_objects::{OrderQueryFilter, OrderTransition, PushMessage, PushTarget, UsageOutcome};
pub use notification_sink::{NotificationSink, NotifierError};
pub use order_lifecycle_database::{LifecycleDbError, OrderLifecycleDatabase};
pub use voucher_management::{VoucherDbError, VoucherManagement};
