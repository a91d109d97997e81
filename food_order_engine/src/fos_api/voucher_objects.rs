use serde::{Deserialize, Serialize};

use crate::db_types::{Voucher, VoucherCategory, Vnd};

pub const MSG_INVALID_CODE: &str = "Invalid or expired voucher code";
pub const MSG_USER_NOT_FOUND: &str = "User not found";
pub const MSG_NOT_YOUR_VOUCHER: &str = "This voucher does not belong to you";
pub const MSG_WRONG_RESTAURANT: &str = "This voucher is not valid for this restaurant";
pub const MSG_WRONG_PRODUCTS: &str = "This voucher is not valid for the products in your order";
pub const MSG_NOT_ELIGIBLE: &str = "You are not eligible to use this voucher";
pub const MSG_USAGE_LIMIT: &str = "This voucher has reached its usage limit";
pub const MSG_VALID: &str = "Voucher is valid";

/// The vouchers a user may currently redeem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibleVouchers {
    pub success: bool,
    pub message: String,
    pub vouchers: Vec<Voucher>,
}

impl EligibleVouchers {
    pub fn found(vouchers: Vec<Voucher>) -> Self {
        let message = format!("{} vouchers available", vouchers.len());
        Self { success: true, message, vouchers }
    }

    pub fn failed<S: Into<String>>(message: S) -> Self {
        Self { success: false, message: message.into(), vouchers: Vec::new() }
    }
}

/// The verdict for a voucher code at checkout. A rejected voucher carries a message meant for the customer and a
/// zero discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherValidation {
    pub is_valid: bool,
    pub message: String,
    pub discount: Vnd,
    pub voucher: Option<Voucher>,
}

impl VoucherValidation {
    pub fn valid(voucher: Voucher, discount: Vnd) -> Self {
        Self { is_valid: true, message: MSG_VALID.to_string(), discount, voucher: Some(voucher) }
    }

    pub fn rejected<S: Into<String>>(message: S) -> Self {
        Self { is_valid: false, message: message.into(), discount: Vnd::default(), voucher: None }
    }

    pub fn minimum_not_met(minimum: Vnd) -> Self {
        Self::rejected(format!("Order total must be at least {minimum} to use this voucher"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub category: VoucherCategory,
    pub name: String,
}

impl From<VoucherCategory> for CategoryInfo {
    fn from(category: VoucherCategory) -> Self {
        Self { category, name: category.display_name().to_string() }
    }
}
