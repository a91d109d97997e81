use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{NewVoucher, User, Voucher},
    traits::data_objects::UsageOutcome,
};

#[derive(Debug, Clone, Error)]
pub enum VoucherDbError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Voucher code {0} is already in use")]
    DuplicateCode(String),
    #[error("Stored voucher record is invalid: {0}")]
    InvalidRecord(String),
}

impl From<sqlx::Error> for VoucherDbError {
    fn from(e: sqlx::Error) -> Self {
        VoucherDbError::DatabaseError(e.to_string())
    }
}

/// Persistence for vouchers and the user data that voucher rules are evaluated against.
///
/// Every method that returns a [`Voucher`] loads its conditions eagerly.
#[allow(async_fn_in_trait)]
pub trait VoucherManagement {
    /// Fetches the voucher with the given code if it is `Active` and expires after `now`.
    async fn fetch_active_voucher_by_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Voucher>, VoucherDbError>;

    /// Fetches every `Active` voucher that expires after `now`.
    async fn fetch_active_vouchers(&self, now: DateTime<Utc>) -> Result<Vec<Voucher>, VoucherDbError>;

    async fn fetch_voucher_by_id(&self, id: i64) -> Result<Option<Voucher>, VoucherDbError>;

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, VoucherDbError>;

    /// The number of orders the user has placed that were not cancelled.
    async fn count_orders_for_user(&self, user_id: i64) -> Result<i64, VoucherDbError>;

    /// Checks whether a voucher other than `excluding` already uses `code`.
    async fn voucher_code_exists(&self, code: &str, excluding: Option<i64>) -> Result<bool, VoucherDbError>;

    /// Stores the voucher and its conditions in one transaction.
    async fn insert_voucher(&self, voucher: NewVoucher, now: DateTime<Utc>) -> Result<Voucher, VoucherDbError>;

    /// Overwrites the voucher's fields and replaces its conditions in one transaction. Returns `None` if there is no
    /// voucher with the given id.
    async fn update_voucher(
        &self,
        id: i64,
        voucher: NewVoucher,
        now: DateTime<Utc>,
    ) -> Result<Option<Voucher>, VoucherDbError>;

    /// Deletes the voucher and its conditions. Returns false if there is no voucher with the given id.
    async fn delete_voucher(&self, id: i64) -> Result<bool, VoucherDbError>;

    /// Consumes one use of the voucher, never taking the usage limit below zero.
    async fn decrement_usage_limit(&self, id: i64, now: DateTime<Utc>) -> Result<UsageOutcome, VoucherDbError>;
}
