use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{NewNotification, Order, OrderStatusType, PaymentStatus};

//--------------------------------------    OrderQueryFilter   ---------------------------------------------------------
/// Criteria for fetching orders. All criteria that are set must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    pub statuses: Vec<OrderStatusType>,
    pub payment_statuses: Vec<PaymentStatus>,
    /// Only orders without a delivery person
    pub unassigned_only: bool,
    /// Only orders placed strictly before this time
    pub placed_before: Option<DateTime<Utc>>,
}

impl OrderQueryFilter {
    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn with_payment_status(mut self, status: PaymentStatus) -> Self {
        self.payment_statuses.push(status);
        self
    }

    pub fn unassigned(mut self) -> Self {
        self.unassigned_only = true;
        self
    }

    pub fn placed_before(mut self, cutoff: DateTime<Utc>) -> Self {
        self.placed_before = Some(cutoff);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty() &&
            self.payment_statuses.is_empty() &&
            !self.unassigned_only &&
            self.placed_before.is_none()
    }

    /// The in-memory equivalent of the query a backend runs for this filter.
    pub fn matches(&self, order: &Order) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&order.status)) &&
            (self.payment_statuses.is_empty() || self.payment_statuses.contains(&order.payment_status)) &&
            (!self.unassigned_only || order.is_unassigned()) &&
            self.placed_before.map_or(true, |cutoff| order.order_date < cutoff)
    }
}

//--------------------------------------      PushMessage      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PushTarget {
    User(i64),
    /// A topic that a set of connected clients listens on, e.g. all staff of a restaurant.
    Group(String),
}

impl PushTarget {
    pub fn restaurant(restaurant_id: i64) -> Self {
        Self::Group(format!("restaurant_{restaurant_id}"))
    }
}

impl Display for PushTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PushTarget::User(id) => write!(f, "user #{id}"),
            PushTarget::Group(key) => write!(f, "group '{key}'"),
        }
    }
}

/// A real-time message for connected clients. Delivery is best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub target: PushTarget,
    pub message: String,
}

impl PushMessage {
    pub fn to_user<S: Into<String>>(user_id: i64, message: S) -> Self {
        Self { target: PushTarget::User(user_id), message: message.into() }
    }

    pub fn to_group<S: Into<String>>(target: PushTarget, message: S) -> Self {
        Self { target, message: message.into() }
    }
}

//--------------------------------------    OrderTransition    ---------------------------------------------------------
/// A planned change to a single order, together with the notifications that describe it.
///
/// `order` is the snapshot the change was planned from. Backends only apply the change if the stored status and payment
/// status still match the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTransition {
    pub order: Order,
    pub new_status: OrderStatusType,
    pub new_payment_status: PaymentStatus,
    pub at: DateTime<Utc>,
    /// Stored in the same transaction as the order change
    pub notifications: Vec<NewNotification>,
    /// Sent after the change has been committed
    pub pushes: Vec<PushMessage>,
}

impl OrderTransition {
    pub fn new(order: Order, at: DateTime<Utc>) -> Self {
        let new_status = order.status;
        let new_payment_status = order.payment_status;
        Self { order, new_status, new_payment_status, at, notifications: Vec::new(), pushes: Vec::new() }
    }

    pub fn to_status(mut self, status: OrderStatusType) -> Self {
        self.new_status = status;
        self
    }

    pub fn to_payment_status(mut self, status: PaymentStatus) -> Self {
        self.new_payment_status = status;
        self
    }

    pub fn notify(mut self, notification: NewNotification) -> Self {
        self.notifications.push(notification);
        self
    }

    pub fn push(mut self, push: PushMessage) -> Self {
        self.pushes.push(push);
        self
    }

    pub fn order_id(&self) -> i64 {
        self.order.id
    }

    /// The order as it looks once the transition has been applied.
    pub fn updated_order(&self) -> Order {
        Order {
            status: self.new_status,
            payment_status: self.new_payment_status,
            updated_at: self.at,
            ..self.order.clone()
        }
    }
}

impl Display for OrderTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "order #{} ({}/{} -> {}/{})",
            self.order.id, self.order.status, self.order.payment_status, self.new_status, self.new_payment_status
        )
    }
}

//--------------------------------------      UsageOutcome     ---------------------------------------------------------
/// The result of consuming one use of a voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageOutcome {
    /// The voucher has no usage limit
    Unlimited,
    /// One use was consumed, leaving this many
    Remaining(i64),
    /// The usage limit was already zero. Nothing changed.
    Exhausted,
    NotFound,
}
