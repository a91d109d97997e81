use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use fos_common::Vnd;
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid {kind}: {value}")]
pub struct ConversionError {
    kind: &'static str,
    value: String,
}

impl ConversionError {
    pub fn new<S: Into<String>>(kind: &'static str, value: S) -> Self {
        Self { kind, value: value.into() }
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been placed and is waiting for the restaurant to confirm it.
    Pending,
    /// The restaurant has prepared the order and is waiting for a delivery person to pick it up.
    ReadyForDelivery,
    /// The delivery person has handed the order to the customer.
    Delivered,
    /// The order is closed. Terminal.
    Completed,
    /// The order was cancelled by a user, an admin or the lifecycle workers. Terminal.
    Cancelled,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::ReadyForDelivery => write!(f, "ReadyForDelivery"),
            OrderStatusType::Delivered => write!(f, "Delivered"),
            OrderStatusType::Completed => write!(f, "Completed"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "ReadyForDelivery" => Ok(Self::ReadyForDelivery),
            "Delivered" => Ok(Self::Delivered),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError::new("order status", s)),
        }
    }
}

//--------------------------------------     PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    Unpaid,
    /// An online payment has been started and the provider has not reported back yet.
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Failed)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Unpaid => write!(f, "Unpaid"),
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Paid => write!(f, "Paid"),
            PaymentStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unpaid" => Ok(Self::Unpaid),
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError::new("payment status", s)),
        }
    }
}

//--------------------------------------     PaymentMethod     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Cash on delivery
    #[sqlx(rename = "COD")]
    #[serde(rename = "COD")]
    Cod,
    /// Any payment made through an online payment provider
    Online,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cod => write!(f, "COD"),
            PaymentMethod::Online => write!(f, "Online"),
        }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub restaurant_id: i64,
    pub delivery_person_id: Option<i64>,
    pub status: OrderStatusType,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub total_amount: Vnd,
    /// The time the order was placed
    pub order_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The customer id, if the order is linked to a real customer account.
    pub fn customer_id(&self) -> Option<i64> {
        (self.user_id > 0).then_some(self.user_id)
    }

    pub fn is_unassigned(&self) -> bool {
        self.delivery_person_id.is_none()
    }
}

//--------------------------------------      OrderDetail      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderDetail {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Vnd,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderDetail {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Vnd,
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
/// A new order as produced by the checkout flow.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i64,
    pub restaurant_id: i64,
    pub delivery_person_id: Option<i64>,
    pub status: OrderStatusType,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub total_amount: Vnd,
    pub order_date: DateTime<Utc>,
    pub details: Vec<NewOrderDetail>,
}

impl NewOrder {
    /// A cash-on-delivery order that is waiting for the restaurant, placed right now.
    pub fn new(user_id: i64, restaurant_id: i64, total_amount: Vnd) -> Self {
        Self {
            user_id,
            restaurant_id,
            delivery_person_id: None,
            status: OrderStatusType::Pending,
            payment_status: PaymentStatus::Unpaid,
            payment_method: PaymentMethod::Cod,
            total_amount,
            order_date: Utc::now(),
            details: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status = status;
        self
    }

    pub fn with_payment(mut self, method: PaymentMethod, status: PaymentStatus) -> Self {
        self.payment_method = method;
        self.payment_status = status;
        self
    }

    pub fn with_delivery_person(mut self, delivery_person_id: i64) -> Self {
        self.delivery_person_id = Some(delivery_person_id);
        self
    }

    pub fn placed_at(mut self, order_date: DateTime<Utc>) -> Self {
        self.order_date = order_date;
        self
    }

    pub fn with_detail(mut self, product_id: i64, quantity: i64, unit_price: Vnd) -> Self {
        self.details.push(NewOrderDetail { product_id, quantity, unit_price });
        self
    }
}

//--------------------------------------          User         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    /// The user category, e.g. "Customer", "VIP", "Shipper"
    pub role: String,
    /// The date the user joined
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    pub fn new<S: Into<String>>(name: S, role: S) -> Self {
        Self { name: name.into(), role: role.into(), created_at: Utc::now() }
    }

    pub fn joined_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

//--------------------------------------      Notification     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNotification {
    pub user_id: i64,
    pub message: String,
}

impl NewNotification {
    pub fn new<S: Into<String>>(user_id: i64, message: S) -> Self {
        Self { user_id, message: message.into() }
    }
}

//--------------------------------------      VoucherType      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum VoucherType {
    /// The discount amount is a flat amount of đồng
    Fixed,
    /// The discount amount is a percentage of the order total
    Percentage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum VoucherStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ApplyMode {
    /// The voucher is handed out to a single user, or to everyone when it has no user.
    Individual,
    /// The voucher is available to whoever satisfies its conditions.
    Condition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum VoucherCategory {
    User,
    Restaurant,
    Product,
    FreeShipping,
}

impl VoucherCategory {
    pub const ALL: [VoucherCategory; 4] = [Self::User, Self::Restaurant, Self::Product, Self::FreeShipping];

    pub fn display_name(&self) -> &'static str {
        match self {
            VoucherCategory::User => "User",
            VoucherCategory::Restaurant => "Restaurant",
            VoucherCategory::Product => "Product",
            VoucherCategory::FreeShipping => "Free Shipping",
        }
    }
}

impl Display for VoucherCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoucherCategory::User => write!(f, "User"),
            VoucherCategory::Restaurant => write!(f, "Restaurant"),
            VoucherCategory::Product => write!(f, "Product"),
            VoucherCategory::FreeShipping => write!(f, "FreeShipping"),
        }
    }
}

//--------------------------------------    ConditionType      ---------------------------------------------------------
/// What a voucher condition is evaluated against. Unknown stored values are kept in `Other` and always fail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionType {
    User,
    Order,
    Product,
    Restaurant,
    Other(String),
}

impl From<String> for ConditionType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "User" => Self::User,
            "Order" => Self::Order,
            "Product" => Self::Product,
            "Restaurant" => Self::Restaurant,
            _ => {
                warn!("🎟️ Unknown voucher condition type: {value}. It will never be satisfied.");
                Self::Other(value)
            },
        }
    }
}

impl Display for ConditionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConditionType::User => write!(f, "User"),
            ConditionType::Order => write!(f, "Order"),
            ConditionType::Product => write!(f, "Product"),
            ConditionType::Restaurant => write!(f, "Restaurant"),
            ConditionType::Other(s) => write!(f, "{s}"),
        }
    }
}

//--------------------------------------    ConditionField     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionField {
    JoinDate,
    TotalOrders,
    /// The user's category. Stored as either `UserCategory` or `Role`.
    UserCategory,
    TotalAmount,
    OrderDate,
    ProductId,
    /// Value is `"<product_id>|<minimum quantity>"`
    MinimumQuantity,
    ProductCategory,
    Other(String),
}

impl From<String> for ConditionField {
    fn from(value: String) -> Self {
        match value.as_str() {
            "JoinDate" => Self::JoinDate,
            "TotalOrders" => Self::TotalOrders,
            "UserCategory" | "Role" => Self::UserCategory,
            "TotalAmount" => Self::TotalAmount,
            "OrderDate" => Self::OrderDate,
            "ProductId" => Self::ProductId,
            "MinimumQuantity" => Self::MinimumQuantity,
            "ProductCategory" => Self::ProductCategory,
            _ => {
                warn!("🎟️ Unknown voucher condition field: {value}. It will never be satisfied.");
                Self::Other(value)
            },
        }
    }
}

impl Display for ConditionField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConditionField::JoinDate => write!(f, "JoinDate"),
            ConditionField::TotalOrders => write!(f, "TotalOrders"),
            ConditionField::UserCategory => write!(f, "UserCategory"),
            ConditionField::TotalAmount => write!(f, "TotalAmount"),
            ConditionField::OrderDate => write!(f, "OrderDate"),
            ConditionField::ProductId => write!(f, "ProductId"),
            ConditionField::MinimumQuantity => write!(f, "MinimumQuantity"),
            ConditionField::ProductCategory => write!(f, "ProductCategory"),
            ConditionField::Other(s) => write!(f, "{s}"),
        }
    }
}

//--------------------------------------   ConditionOperator   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionOperator {
    Gt,
    Lt,
    Eq,
    Gte,
    Lte,
    In,
    Includes,
    Excludes,
    Other(String),
}

impl From<String> for ConditionOperator {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            ">" => Self::Gt,
            "<" => Self::Lt,
            "=" | "==" => Self::Eq,
            ">=" => Self::Gte,
            "<=" => Self::Lte,
            "IN" => Self::In,
            "INCLUDES" => Self::Includes,
            "EXCLUDES" => Self::Excludes,
            _ => {
                warn!("🎟️ Unknown voucher condition operator: {value}. It will never be satisfied.");
                Self::Other(value)
            },
        }
    }
}

impl Display for ConditionOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConditionOperator::Gt => write!(f, ">"),
            ConditionOperator::Lt => write!(f, "<"),
            ConditionOperator::Eq => write!(f, "="),
            ConditionOperator::Gte => write!(f, ">="),
            ConditionOperator::Lte => write!(f, "<="),
            ConditionOperator::In => write!(f, "IN"),
            ConditionOperator::Includes => write!(f, "INCLUDES"),
            ConditionOperator::Excludes => write!(f, "EXCLUDES"),
            ConditionOperator::Other(s) => write!(f, "{s}"),
        }
    }
}

//--------------------------------------   VoucherCondition    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherCondition {
    pub id: i64,
    pub voucher_id: i64,
    pub condition_type: ConditionType,
    pub field: ConditionField,
    pub operator: ConditionOperator,
    /// The string-encoded operand
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVoucherCondition {
    pub condition_type: ConditionType,
    pub field: ConditionField,
    pub operator: ConditionOperator,
    pub value: String,
}

impl NewVoucherCondition {
    pub fn new<S: Into<String>>(
        condition_type: ConditionType,
        field: ConditionField,
        operator: ConditionOperator,
        value: S,
    ) -> Self {
        Self { condition_type, field, operator, value: value.into() }
    }
}

//--------------------------------------        Voucher        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    pub id: i64,
    pub code: String,
    pub voucher_type: VoucherType,
    /// A flat amount for `Fixed` vouchers, a percentage for `Percentage` vouchers.
    pub discount_amount: Decimal,
    pub minimum_order_amount: Option<Vnd>,
    /// Caps the discount of `Percentage` vouchers
    pub maximum_discount_amount: Option<Vnd>,
    /// Remaining redemptions. `None` is unlimited, zero is exhausted.
    pub usage_limit: Option<i64>,
    pub expiration_date: DateTime<Utc>,
    pub status: VoucherStatus,
    pub apply_mode: ApplyMode,
    pub category: VoucherCategory,
    pub user_id: Option<i64>,
    pub restaurant_id: Option<i64>,
    pub product_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub conditions: Vec<VoucherCondition>,
}

impl Voucher {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == VoucherStatus::Active && self.expiration_date > now
    }
}

//--------------------------------------       NewVoucher      ---------------------------------------------------------
/// The writable fields of a voucher, used for both creating and updating vouchers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVoucher {
    pub code: String,
    pub voucher_type: VoucherType,
    pub discount_amount: Decimal,
    pub minimum_order_amount: Option<Vnd>,
    pub maximum_discount_amount: Option<Vnd>,
    pub usage_limit: Option<i64>,
    pub expiration_date: DateTime<Utc>,
    pub status: VoucherStatus,
    pub apply_mode: ApplyMode,
    pub category: VoucherCategory,
    pub user_id: Option<i64>,
    pub restaurant_id: Option<i64>,
    pub product_id: Option<i64>,
    pub conditions: Vec<NewVoucherCondition>,
}

impl NewVoucher {
    /// An active, public, unlimited voucher in the `User` category.
    pub fn new<S: Into<String>>(
        code: S,
        voucher_type: VoucherType,
        discount_amount: Decimal,
        expiration_date: DateTime<Utc>,
    ) -> Self {
        Self {
            code: code.into(),
            voucher_type,
            discount_amount,
            minimum_order_amount: None,
            maximum_discount_amount: None,
            usage_limit: None,
            expiration_date,
            status: VoucherStatus::Active,
            apply_mode: ApplyMode::Individual,
            category: VoucherCategory::User,
            user_id: None,
            restaurant_id: None,
            product_id: None,
            conditions: Vec::new(),
        }
    }

    pub fn with_minimum_order(mut self, amount: Vnd) -> Self {
        self.minimum_order_amount = Some(amount);
        self
    }

    pub fn with_maximum_discount(mut self, amount: Vnd) -> Self {
        self.maximum_discount_amount = Some(amount);
        self
    }

    pub fn with_usage_limit(mut self, limit: i64) -> Self {
        self.usage_limit = Some(limit);
        self
    }

    pub fn with_category(mut self, category: VoucherCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_apply_mode(mut self, apply_mode: ApplyMode) -> Self {
        self.apply_mode = apply_mode;
        self
    }

    pub fn with_status(mut self, status: VoucherStatus) -> Self {
        self.status = status;
        self
    }

    pub fn for_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn for_restaurant(mut self, restaurant_id: i64) -> Self {
        self.restaurant_id = Some(restaurant_id);
        self
    }

    pub fn for_product(mut self, product_id: i64) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn with_condition(mut self, condition: NewVoucherCondition) -> Self {
        self.conditions.push(condition);
        self
    }
}
