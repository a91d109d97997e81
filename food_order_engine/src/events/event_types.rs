use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::Order,
    traits::{OrderTransition, PushTarget},
};

/// A real-time message that should be delivered to connected clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimePushEvent {
    pub target: PushTarget,
    pub message: String,
    pub pushed_at: DateTime<Utc>,
}

impl RealtimePushEvent {
    pub fn new<S: Into<String>>(target: PushTarget, message: S) -> Self {
        Self { target, message: message.into(), pushed_at: Utc::now() }
    }
}

/// Emitted once a lifecycle transition has been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTransitionedEvent {
    pub old_order: Order,
    pub new_order: Order,
}

impl OrderTransitionedEvent {
    pub fn new(old_order: Order, new_order: Order) -> Self {
        Self { old_order, new_order }
    }
}

impl From<&OrderTransition> for OrderTransitionedEvent {
    fn from(transition: &OrderTransition) -> Self {
        Self::new(transition.order.clone(), transition.updated_order())
    }
}
