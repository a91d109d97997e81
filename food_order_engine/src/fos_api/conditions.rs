//! Voucher condition evaluation.
//!
//! Conditions are evaluated in two stages. At eligibility and validation time only the user is known, so only `User`
//! conditions are checked and order-level conditions are deferred. Once the order and its lines exist,
//! [`conditions_hold_for_order`] checks the `Order` and `Product` conditions.
//!
//! Every combination of condition type, field and operator that is not explicitly handled evaluates to false.
use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::*;
use rust_decimal::Decimal;

use crate::{
    clock::LocalTimezone,
    db_types::{ConditionField, ConditionOperator, ConditionType, Order, OrderDetail, User, VoucherCondition},
};

/// What is known about the customer before an order exists.
#[derive(Debug, Clone, Copy)]
pub struct UserContext<'a> {
    pub user: Option<&'a User>,
    /// Orders the user has placed that were not cancelled
    pub order_count: i64,
}

impl<'a> UserContext<'a> {
    pub fn new(user: Option<&'a User>, order_count: i64) -> Self {
        Self { user, order_count }
    }
}

/// Checks the conditions that can be resolved from the user alone. Conditions on the order, its products or the
/// restaurant are deferred and count as satisfied here.
pub fn conditions_hold_for_user(conditions: &[VoucherCondition], ctx: &UserContext, tz: &LocalTimezone) -> bool {
    conditions.iter().all(|c| match c.condition_type {
        ConditionType::User => evaluate_user_condition(c, ctx, tz),
        ConditionType::Order | ConditionType::Product | ConditionType::Restaurant => true,
        ConditionType::Other(_) => false,
    })
}

/// Checks the conditions that need the order and its lines. User and restaurant conditions were checked when the
/// voucher was validated and are skipped.
pub fn conditions_hold_for_order(
    conditions: &[VoucherCondition],
    order: &Order,
    details: &[OrderDetail],
    tz: &LocalTimezone,
) -> bool {
    conditions.iter().all(|c| match c.condition_type {
        ConditionType::User | ConditionType::Restaurant => true,
        ConditionType::Order => evaluate_order_condition(c, order, tz),
        ConditionType::Product => evaluate_product_condition(c, details),
        ConditionType::Other(_) => false,
    })
}

pub fn evaluate_user_condition(condition: &VoucherCondition, ctx: &UserContext, tz: &LocalTimezone) -> bool {
    let Some(user) = ctx.user else {
        return false;
    };
    match condition.field {
        ConditionField::JoinDate => compare_dates(&condition.operator, user.created_at, &condition.value, tz),
        ConditionField::TotalOrders => {
            compare_numbers(&condition.operator, Decimal::from(ctx.order_count), &condition.value)
        },
        ConditionField::UserCategory => match condition.operator {
            ConditionOperator::Eq => user.role == condition.value,
            ConditionOperator::In => parse_string_list(&condition.value).iter().any(|r| *r == user.role),
            _ => false,
        },
        _ => false,
    }
}

pub fn evaluate_order_condition(condition: &VoucherCondition, order: &Order, tz: &LocalTimezone) -> bool {
    match condition.field {
        ConditionField::TotalAmount => {
            compare_numbers(&condition.operator, Decimal::from(order.total_amount.value()), &condition.value)
        },
        ConditionField::OrderDate => compare_dates(&condition.operator, order.order_date, &condition.value, tz),
        _ => false,
    }
}

pub fn evaluate_product_condition(condition: &VoucherCondition, details: &[OrderDetail]) -> bool {
    match condition.field {
        ConditionField::ProductId => {
            let Ok(product_id) = condition.value.trim().parse::<i64>() else {
                return false;
            };
            let included = details.iter().any(|d| d.product_id == product_id);
            match condition.operator {
                ConditionOperator::Includes => included,
                ConditionOperator::Excludes => !included,
                _ => false,
            }
        },
        ConditionField::MinimumQuantity => {
            let Some((product_id, minimum)) = parse_minimum_quantity(&condition.value) else {
                return false;
            };
            let quantity: i64 = details.iter().filter(|d| d.product_id == product_id).map(|d| d.quantity).sum();
            quantity >= minimum
        },
        // Product categories are not loaded with the order lines, so this condition cannot be checked yet.
        // TODO: batch-load product categories for the order lines and compare them here.
        ConditionField::ProductCategory => true,
        _ => false,
    }
}

fn compare_numbers(op: &ConditionOperator, actual: Decimal, value: &str) -> bool {
    let Ok(expected) = Decimal::from_str(value.trim()) else {
        debug!("🎟️ Voucher condition value '{value}' is not a number");
        return false;
    };
    match op {
        ConditionOperator::Gt => actual > expected,
        ConditionOperator::Gte => actual >= expected,
        ConditionOperator::Lt => actual < expected,
        ConditionOperator::Lte => actual <= expected,
        ConditionOperator::Eq => actual == expected,
        _ => false,
    }
}

/// `>` and `<` compare instants. `=` compares local calendar dates.
fn compare_dates(op: &ConditionOperator, actual: DateTime<Utc>, value: &str, tz: &LocalTimezone) -> bool {
    let Some(expected) = tz.parse_local(value) else {
        debug!("🎟️ Voucher condition value '{value}' is not a date");
        return false;
    };
    match op {
        ConditionOperator::Gt => actual > expected,
        ConditionOperator::Lt => actual < expected,
        ConditionOperator::Eq => tz.local_date(actual) == tz.local_date(expected),
        _ => false,
    }
}

/// Parses a JSON array of strings, e.g. `["VIP","Gold"]`. Anything else is an empty list.
fn parse_string_list(value: &str) -> Vec<String> {
    serde_json::from_str::<Vec<String>>(value).unwrap_or_else(|e| {
        debug!("🎟️ Voucher condition value '{value}' is not a JSON string array. {e}");
        Vec::new()
    })
}

/// Parses `"<product_id>|<minimum quantity>"`.
fn parse_minimum_quantity(value: &str) -> Option<(i64, i64)> {
    let (product, minimum) = value.split_once('|')?;
    Some((product.trim().parse().ok()?, minimum.trim().parse().ok()?))
}
