use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    clock::{Clock, LocalTimezone, SystemClock},
    db_types::Order,
    events::{EventProducers, OrderTransitionedEvent},
    fos_api::{
        errors::LifecycleApiError,
        lifecycle_objects::{LifecyclePolicy, LifecycleTask, PassReport},
    },
    traits::{NotificationSink, OrderLifecycleDatabase, OrderTransition},
};

/// `OrderLifecycleApi` drives the time-based order transitions: auto-cancelling stale orders, auto-completing
/// delivered ones and failing timed-out payments.
///
/// The API holds no state between passes. Callers are expected to build a fresh instance (with a fresh backend
/// handle) for every pass.
pub struct OrderLifecycleApi<B, N, C = SystemClock> {
    db: B,
    notifier: N,
    clock: C,
    timezone: LocalTimezone,
    policy: LifecyclePolicy,
    producers: EventProducers,
}

impl<B, N, C> Debug for OrderLifecycleApi<B, N, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderLifecycleApi ({:?}, {})", self.policy, self.timezone.offset())
    }
}

impl<B, N> OrderLifecycleApi<B, N, SystemClock> {
    pub fn new(db: B, notifier: N) -> Self {
        Self::new_with_clock(db, notifier, SystemClock)
    }
}

impl<B, N, C> OrderLifecycleApi<B, N, C> {
    pub fn new_with_clock(db: B, notifier: N, clock: C) -> Self {
        Self {
            db,
            notifier,
            clock,
            timezone: LocalTimezone::default(),
            policy: LifecyclePolicy::default(),
            producers: EventProducers::default(),
        }
    }

    pub fn with_timezone(mut self, timezone: LocalTimezone) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_policy(mut self, policy: LifecyclePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Subscribers to these producers are told about every committed transition.
    pub fn with_producers(mut self, producers: EventProducers) -> Self {
        self.producers = producers;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn policy(&self) -> &LifecyclePolicy {
        &self.policy
    }
}

impl<B, N, C> OrderLifecycleApi<B, N, C>
where
    B: OrderLifecycleDatabase,
    N: NotificationSink,
    C: Clock,
{
    /// Runs a single pass of the given task.
    ///
    /// All candidate orders are fetched in one query, checked against the task's rule in local time and committed as
    /// one batch. Real-time pushes are sent only after the batch has been committed; a failed push is logged and does
    /// not affect the result.
    ///
    /// If the query or the commit fails, or the task's threshold cannot be subtracted from the current time, nothing is
    /// changed and the error is returned. The next pass will pick up the
    /// same orders again.
    pub async fn run_task(&self, task: LifecycleTask) -> Result<PassReport, LifecycleApiError> {
        let now = self.clock.now();
        let threshold = self.policy.threshold(task);
        let cutoff = now.checked_sub_signed(threshold).ok_or(LifecycleApiError::ThresholdOutOfRange(task))?;
        let candidates = self.db.fetch_orders(task.candidate_query(cutoff)).await?;
        trace!("🔄️ [{task}] {} candidate orders fetched", candidates.len());
        let transitions = self.plan_transitions(task, &candidates, now);
        let mut report = PassReport::empty(task);
        report.examined = candidates.len();
        if transitions.is_empty() {
            return Ok(report);
        }
        let applied = self.db.commit_transitions(&transitions).await?;
        report.applied = applied.iter().map(OrderTransition::order_id).collect();
        report.skipped = transitions
            .iter()
            .map(OrderTransition::order_id)
            .filter(|id| !report.applied.contains(id))
            .collect();
        if !report.skipped.is_empty() {
            warn!(
                "🔄️ [{task}] Orders {:?} changed while the pass was running. They will be re-checked next time.",
                report.skipped
            );
        }
        for transition in &applied {
            debug!("🔄️ [{task}] {transition}");
        }
        self.send_pushes(task, &applied).await;
        self.publish_transitions(&applied).await;
        Ok(report)
    }

    /// Filters the candidates down to the orders that are due, and plans a transition for each.
    pub fn plan_transitions(
        &self,
        task: LifecycleTask,
        candidates: &[Order],
        now: DateTime<Utc>,
    ) -> Vec<OrderTransition> {
        candidates
            .iter()
            .filter(|order| task.is_due(order, now, &self.timezone, &self.policy))
            .map(|order| task.plan(order, now))
            .collect()
    }

    async fn send_pushes(&self, task: LifecycleTask, applied: &[OrderTransition]) {
        for push in applied.iter().flat_map(|t| t.pushes.iter()) {
            if let Err(e) = self.notifier.push(push).await {
                warn!("🔄️ [{task}] Could not push notification to {}. {e}", push.target);
            }
        }
    }

    async fn publish_transitions(&self, applied: &[OrderTransition]) {
        if self.producers.order_transitioned_producer.is_empty() {
            return;
        }
        for transition in applied {
            self.producers.publish_transition(OrderTransitionedEvent::from(transition)).await;
        }
    }
}
