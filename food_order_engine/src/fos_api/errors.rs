use thiserror::Error;

use crate::{
    fos_api::lifecycle_objects::LifecycleTask,
    traits::{LifecycleDbError, VoucherDbError},
};

#[derive(Debug, Clone, Error)]
pub enum LifecycleApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The {0} threshold reaches further back than the calendar allows")]
    ThresholdOutOfRange(LifecycleTask),
}

impl From<LifecycleDbError> for LifecycleApiError {
    fn from(e: LifecycleDbError) -> Self {
        LifecycleApiError::DatabaseError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum VoucherAdminError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Voucher code {0} is already in use")]
    DuplicateCode(String),
    #[error("Voucher #{0} does not exist")]
    VoucherNotFound(i64),
    #[error("Invalid voucher: {0}")]
    InvalidVoucher(String),
    #[error("Voucher #{0} has reached its usage limit")]
    UsageLimitReached(i64),
    #[error("Could not find an unused voucher code after {0} attempts")]
    CodeSpaceExhausted(usize),
}

impl From<VoucherDbError> for VoucherAdminError {
    fn from(e: VoucherDbError) -> Self {
        match e {
            VoucherDbError::DuplicateCode(code) => VoucherAdminError::DuplicateCode(code),
            e => VoucherAdminError::DatabaseError(e.to_string()),
        }
    }
}
