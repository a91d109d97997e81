use thiserror::Error;

use crate::{
    db_types::Order,
    traits::data_objects::{OrderQueryFilter, OrderTransition},
};

#[derive(Debug, Clone, Error)]
pub enum LifecycleDbError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Could not build order query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for LifecycleDbError {
    fn from(e: sqlx::Error) -> Self {
        LifecycleDbError::DatabaseError(e.to_string())
    }
}

/// The persistence contract used by the order lifecycle workers.
///
/// A lifecycle pass makes exactly two calls: one [`fetch_orders`](Self::fetch_orders) to collect every candidate order
/// for the task, and one [`commit_transitions`](Self::commit_transitions) to store the whole batch.
#[allow(async_fn_in_trait)]
pub trait OrderLifecycleDatabase: Clone {
    /// Fetches every order that matches the filter, oldest first.
    async fn fetch_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, LifecycleDbError>;

    /// Applies the given transitions in a single atomic transaction.
    ///
    /// For each transition, the order's status and payment status are updated only if they still equal the values in
    /// the transition's `order` snapshot. If they do, the transition's notifications are inserted as part of the same
    /// transaction. If they don't (someone else changed the order since it was read), that transition is skipped and
    /// the rest of the batch continues.
    ///
    /// Any other failure rolls back the entire batch, so that no order changes and no notifications are stored.
    ///
    /// Returns the transitions that were applied.
    async fn commit_transitions(
        &self,
        transitions: &[OrderTransition],
    ) -> Result<Vec<OrderTransition>, LifecycleDbError>;
}
