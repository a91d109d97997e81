use std::fmt::Display;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    clock::LocalTimezone,
    db_types::{NewNotification, Order, OrderStatusType, PaymentMethod, PaymentStatus},
    traits::{OrderQueryFilter, OrderTransition, PushMessage, PushTarget},
};

//--------------------------------------     LifecycleTask     ---------------------------------------------------------
/// The recurring order lifecycle tasks. Each one scans for a single kind of stale order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleTask {
    /// Cancels orders the restaurant never confirmed.
    PendingOrderTimeout,
    /// Cancels prepared orders that no delivery person picked up.
    UnassignedDeliveryTimeout,
    /// Completes delivered orders, settling cash-on-delivery payments.
    DeliveredAutoComplete,
    /// Fails online payments that never came back from the provider, and cancels their orders.
    PaymentTimeout,
}

impl LifecycleTask {
    pub const ALL: [LifecycleTask; 4] = [
        Self::PendingOrderTimeout,
        Self::UnassignedDeliveryTimeout,
        Self::DeliveredAutoComplete,
        Self::PaymentTimeout,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LifecycleTask::PendingOrderTimeout => "pending-order-timeout",
            LifecycleTask::UnassignedDeliveryTimeout => "unassigned-delivery-timeout",
            LifecycleTask::DeliveredAutoComplete => "delivered-auto-complete",
            LifecycleTask::PaymentTimeout => "payment-timeout",
        }
    }

    /// The backend query that collects every candidate order for this task. Orders placed before `cutoff` are
    /// candidates; [`LifecycleTask::is_due`] has the final say.
    pub fn candidate_query(&self, cutoff: DateTime<Utc>) -> OrderQueryFilter {
        let query = OrderQueryFilter::default().placed_before(cutoff);
        match self {
            LifecycleTask::PendingOrderTimeout => query.with_status(OrderStatusType::Pending),
            LifecycleTask::UnassignedDeliveryTimeout => query.with_status(OrderStatusType::ReadyForDelivery).unassigned(),
            LifecycleTask::DeliveredAutoComplete => query.with_status(OrderStatusType::Delivered),
            LifecycleTask::PaymentTimeout => query
                .with_payment_status(PaymentStatus::Pending)
                .with_status(OrderStatusType::Pending)
                .with_status(OrderStatusType::ReadyForDelivery)
                .with_status(OrderStatusType::Delivered),
        }
    }

    /// Whether the order is in this task's trigger state. Time is not considered.
    pub fn applies_to(&self, order: &Order) -> bool {
        if order.status.is_terminal() {
            return false;
        }
        match self {
            LifecycleTask::PendingOrderTimeout => order.status == OrderStatusType::Pending,
            LifecycleTask::UnassignedDeliveryTimeout => {
                order.status == OrderStatusType::ReadyForDelivery && order.is_unassigned()
            },
            LifecycleTask::DeliveredAutoComplete => order.status == OrderStatusType::Delivered,
            LifecycleTask::PaymentTimeout => order.payment_status == PaymentStatus::Pending,
        }
    }

    /// Whether the order is in this task's trigger state and more than the task's threshold of local wall-clock time
    /// has passed since it was placed.
    pub fn is_due(&self, order: &Order, now: DateTime<Utc>, tz: &LocalTimezone, policy: &LifecyclePolicy) -> bool {
        self.applies_to(order) && tz.elapsed(now, order.order_date) > policy.threshold(*self)
    }

    /// Builds the transition this task applies to a due order.
    pub fn plan(&self, order: &Order, now: DateTime<Utc>) -> OrderTransition {
        let transition = OrderTransition::new(order.clone(), now);
        let id = order.id;
        match self {
            LifecycleTask::PendingOrderTimeout => {
                let transition = transition.to_status(OrderStatusType::Cancelled);
                match order.customer_id() {
                    Some(user_id) => {
                        let msg = format!(
                            "Your order #{id} was cancelled because the restaurant did not confirm it in time."
                        );
                        transition.notify(NewNotification::new(user_id, msg.clone())).push(PushMessage::to_user(user_id, msg))
                    },
                    None => transition,
                }
            },
            LifecycleTask::UnassignedDeliveryTimeout => {
                let mut transition = transition.to_status(OrderStatusType::Cancelled);
                if let Some(user_id) = order.customer_id() {
                    let msg = format!("Your order #{id} was cancelled because no delivery person was available.");
                    transition =
                        transition.notify(NewNotification::new(user_id, msg.clone())).push(PushMessage::to_user(user_id, msg));
                }
                let msg = format!("Order #{id} was cancelled automatically because no delivery person accepted it.");
                transition.push(PushMessage::to_group(PushTarget::restaurant(order.restaurant_id), msg))
            },
            LifecycleTask::DeliveredAutoComplete => {
                let mut transition = transition.to_status(OrderStatusType::Completed);
                if order.payment_method == PaymentMethod::Cod && order.payment_status == PaymentStatus::Unpaid {
                    transition = transition.to_payment_status(PaymentStatus::Paid);
                }
                if let Some(user_id) = order.customer_id() {
                    let msg = format!("Your order #{id} has been completed. Thank you for ordering with us!");
                    transition =
                        transition.notify(NewNotification::new(user_id, msg.clone())).push(PushMessage::to_user(user_id, msg));
                }
                if let Some(shipper_id) = order.delivery_person_id {
                    let msg = format!("Order #{id} that you delivered has been marked as completed.");
                    transition = transition
                        .notify(NewNotification::new(shipper_id, msg.clone()))
                        .push(PushMessage::to_user(shipper_id, msg));
                }
                transition
            },
            LifecycleTask::PaymentTimeout => {
                transition.to_payment_status(PaymentStatus::Failed).to_status(OrderStatusType::Cancelled)
            },
        }
    }
}

impl Display for LifecycleTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

//--------------------------------------    LifecyclePolicy    ---------------------------------------------------------
/// How long an order may sit in each trigger state before its task acts on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    pub pending_order_timeout: Duration,
    pub unassigned_delivery_timeout: Duration,
    pub delivered_completion: Duration,
    pub payment_timeout: Duration,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            pending_order_timeout: Duration::minutes(30),
            unassigned_delivery_timeout: Duration::minutes(30),
            delivered_completion: Duration::hours(8),
            payment_timeout: Duration::minutes(15),
        }
    }
}

impl LifecyclePolicy {
    pub fn threshold(&self, task: LifecycleTask) -> Duration {
        match task {
            LifecycleTask::PendingOrderTimeout => self.pending_order_timeout,
            LifecycleTask::UnassignedDeliveryTimeout => self.unassigned_delivery_timeout,
            LifecycleTask::DeliveredAutoComplete => self.delivered_completion,
            LifecycleTask::PaymentTimeout => self.payment_timeout,
        }
    }
}

//--------------------------------------      PassReport       ---------------------------------------------------------
/// The outcome of a single lifecycle pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    pub task: LifecycleTask,
    /// Candidate orders returned by the backend query
    pub examined: usize,
    /// Ids of the orders that were transitioned
    pub applied: Vec<i64>,
    /// Ids of due orders that changed underneath the pass and were left for the next one
    pub skipped: Vec<i64>,
}

impl PassReport {
    pub fn empty(task: LifecycleTask) -> Self {
        Self { task, examined: 0, applied: Vec::new(), skipped: Vec::new() }
    }
}

impl Display for PassReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} examined, {} transitioned, {} skipped",
            self.task,
            self.examined,
            self.applied.len(),
            self.skipped.len()
        )
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;
    use fos_common::Vnd;

    use super::*;

    fn order(status: OrderStatusType, payment_status: PaymentStatus, minutes_ago: i64, now: DateTime<Utc>) -> Order {
        let placed = now - Duration::minutes(minutes_ago);
        Order {
            id: 1,
            user_id: 10,
            restaurant_id: 3,
            delivery_person_id: None,
            status,
            payment_status,
            payment_method: PaymentMethod::Cod,
            total_amount: Vnd::from(100_000),
            order_date: placed,
            updated_at: placed,
        }
    }

    #[test]
    fn thresholds_are_strict() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let tz = LocalTimezone::default();
        let policy = LifecyclePolicy::default();
        let task = LifecycleTask::PendingOrderTimeout;
        assert!(!task.is_due(&order(OrderStatusType::Pending, PaymentStatus::Unpaid, 30, now), now, &tz, &policy));
        assert!(task.is_due(&order(OrderStatusType::Pending, PaymentStatus::Unpaid, 31, now), now, &tz, &policy));
        assert!(!task.is_due(&order(OrderStatusType::Cancelled, PaymentStatus::Unpaid, 90, now), now, &tz, &policy));
    }

    #[test]
    fn payment_timeout_never_touches_terminal_orders() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let tz = LocalTimezone::default();
        let policy = LifecyclePolicy::default();
        let task = LifecycleTask::PaymentTimeout;
        let due = order(OrderStatusType::Delivered, PaymentStatus::Pending, 16, now);
        assert!(task.is_due(&due, now, &tz, &policy));
        let completed = order(OrderStatusType::Completed, PaymentStatus::Pending, 60, now);
        assert!(!task.is_due(&completed, now, &tz, &policy));
        let t = task.plan(&due, now);
        assert_eq!(t.new_status, OrderStatusType::Cancelled);
        assert_eq!(t.new_payment_status, PaymentStatus::Failed);
        assert!(t.notifications.is_empty());
        assert!(t.pushes.is_empty());
    }

    #[test]
    fn unassigned_delivery_notifies_customer_and_restaurant() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let o = order(OrderStatusType::ReadyForDelivery, PaymentStatus::Unpaid, 45, now);
        let t = LifecycleTask::UnassignedDeliveryTimeout.plan(&o, now);
        assert_eq!(t.new_status, OrderStatusType::Cancelled);
        assert_eq!(t.notifications.len(), 1);
        assert_eq!(t.notifications[0].user_id, 10);
        let targets = t.pushes.iter().map(|p| p.target.clone()).collect::<Vec<_>>();
        assert_eq!(targets, vec![PushTarget::User(10), PushTarget::Group("restaurant_3".into())]);
    }

    #[test]
    fn delivered_cod_orders_are_settled() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut o = order(OrderStatusType::Delivered, PaymentStatus::Unpaid, 9 * 60, now);
        o.delivery_person_id = Some(77);
        let t = LifecycleTask::DeliveredAutoComplete.plan(&o, now);
        assert_eq!(t.new_status, OrderStatusType::Completed);
        assert_eq!(t.new_payment_status, PaymentStatus::Paid);
        let recipients = t.notifications.iter().map(|n| n.user_id).collect::<Vec<_>>();
        assert_eq!(recipients, vec![10, 77]);

        o.payment_method = PaymentMethod::Online;
        o.user_id = 0;
        let t = LifecycleTask::DeliveredAutoComplete.plan(&o, now);
        assert_eq!(t.new_payment_status, PaymentStatus::Unpaid);
        assert_eq!(t.notifications.len(), 1);
        assert_eq!(t.notifications[0].user_id, 77);
    }

    #[test]
    fn candidate_queries_match_trigger_states() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let cutoff = now - Duration::minutes(15);
        let q = LifecycleTask::PaymentTimeout.candidate_query(cutoff);
        assert!(q.matches(&order(OrderStatusType::Pending, PaymentStatus::Pending, 20, now)));
        assert!(!q.matches(&order(OrderStatusType::Cancelled, PaymentStatus::Pending, 20, now)));
        assert!(!q.matches(&order(OrderStatusType::Pending, PaymentStatus::Pending, 10, now)));
        let mut assigned = order(OrderStatusType::ReadyForDelivery, PaymentStatus::Unpaid, 60, now);
        assigned.delivery_person_id = Some(4);
        assert!(!LifecycleTask::UnassignedDeliveryTimeout.candidate_query(cutoff).matches(&assigned));
    }
}
