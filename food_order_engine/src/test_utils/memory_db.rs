use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};

use crate::{
    db_types::{
        NewOrder,
        NewUser,
        NewVoucher,
        Notification,
        Order,
        OrderDetail,
        OrderStatusType,
        User,
        Voucher,
        VoucherCondition,
    },
    traits::{
        LifecycleDbError,
        OrderLifecycleDatabase,
        OrderQueryFilter,
        OrderTransition,
        UsageOutcome,
        VoucherDbError,
        VoucherManagement,
    },
};

#[derive(Debug, Clone, Default)]
struct State {
    next_id: i64,
    orders: BTreeMap<i64, Order>,
    details: Vec<OrderDetail>,
    users: BTreeMap<i64, User>,
    notifications: Vec<Notification>,
    vouchers: BTreeMap<i64, Voucher>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
struct Faults {
    fail_fetch: bool,
    fail_commit: bool,
    /// Status written to an order straight after it is fetched, as if another writer got there first
    interfere: Option<(i64, OrderStatusType)>,
    fetch_calls: usize,
    commit_calls: usize,
}

/// An in-memory backend for tests. Clones share the same data.
///
/// Commits are all-or-nothing, like a real transaction, and faults can be injected into fetches and commits.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<State>>,
    faults: Arc<Mutex<Faults>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("state lock poisoned")
    }

    fn faults(&self) -> MutexGuard<'_, Faults> {
        self.faults.lock().expect("fault lock poisoned")
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.faults().fail_fetch = fail;
    }

    pub fn fail_commits(&self, fail: bool) {
        self.faults().fail_commit = fail;
    }

    /// After the next fetch, the given order's status is changed behind the caller's back.
    pub fn interfere_after_fetch(&self, order_id: i64, status: OrderStatusType) {
        self.faults().interfere = Some((order_id, status));
    }

    pub fn fetch_calls(&self) -> usize {
        self.faults().fetch_calls
    }

    pub fn commit_calls(&self) -> usize {
        self.faults().commit_calls
    }

    pub fn insert_order(&self, order: NewOrder) -> Order {
        let mut state = self.state();
        let id = state.next_id();
        let inserted = Order {
            id,
            user_id: order.user_id,
            restaurant_id: order.restaurant_id,
            delivery_person_id: order.delivery_person_id,
            status: order.status,
            payment_status: order.payment_status,
            payment_method: order.payment_method,
            total_amount: order.total_amount,
            order_date: order.order_date,
            updated_at: order.order_date,
        };
        for d in order.details {
            let detail_id = state.next_id();
            state.details.push(OrderDetail {
                id: detail_id,
                order_id: id,
                product_id: d.product_id,
                quantity: d.quantity,
                unit_price: d.unit_price,
            });
        }
        state.orders.insert(id, inserted.clone());
        inserted
    }

    pub fn insert_user(&self, user: NewUser) -> User {
        let mut state = self.state();
        let id = state.next_id();
        let user = User { id, name: user.name, role: user.role, created_at: user.created_at };
        state.users.insert(id, user.clone());
        user
    }

    pub fn order(&self, id: i64) -> Option<Order> {
        self.state().orders.get(&id).cloned()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.state().orders.values().cloned().collect()
    }

    pub fn order_details(&self, order_id: i64) -> Vec<OrderDetail> {
        self.state().details.iter().filter(|d| d.order_id == order_id).cloned().collect()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state().notifications.clone()
    }

    pub fn notifications_for(&self, user_id: i64) -> Vec<Notification> {
        self.state().notifications.iter().filter(|n| n.user_id == user_id).cloned().collect()
    }

    pub fn voucher(&self, id: i64) -> Option<Voucher> {
        self.state().vouchers.get(&id).cloned()
    }

    fn build_voucher(state: &mut State, id: i64, v: NewVoucher, created_at: DateTime<Utc>, now: DateTime<Utc>) -> Voucher {
        let conditions = v
            .conditions
            .into_iter()
            .map(|c| VoucherCondition {
                id: state.next_id(),
                voucher_id: id,
                condition_type: c.condition_type,
                field: c.field,
                operator: c.operator,
                value: c.value,
            })
            .collect();
        Voucher {
            id,
            code: v.code,
            voucher_type: v.voucher_type,
            discount_amount: v.discount_amount,
            minimum_order_amount: v.minimum_order_amount,
            maximum_discount_amount: v.maximum_discount_amount,
            usage_limit: v.usage_limit,
            expiration_date: v.expiration_date,
            status: v.status,
            apply_mode: v.apply_mode,
            category: v.category,
            user_id: v.user_id,
            restaurant_id: v.restaurant_id,
            product_id: v.product_id,
            created_at,
            updated_at: now,
            conditions,
        }
    }
}

impl OrderLifecycleDatabase for MemoryDatabase {
    async fn fetch_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, LifecycleDbError> {
        let interfere = {
            let mut faults = self.faults();
            faults.fetch_calls += 1;
            if faults.fail_fetch {
                return Err(LifecycleDbError::DatabaseError("database is locked".into()));
            }
            faults.interfere.take()
        };
        let mut state = self.state();
        let mut orders = state.orders.values().filter(|o| query.matches(o)).cloned().collect::<Vec<_>>();
        orders.sort_by_key(|o| o.order_date);
        if let Some((id, status)) = interfere {
            if let Some(order) = state.orders.get_mut(&id) {
                order.status = status;
            }
        }
        Ok(orders)
    }

    async fn commit_transitions(
        &self,
        transitions: &[OrderTransition],
    ) -> Result<Vec<OrderTransition>, LifecycleDbError> {
        {
            let mut faults = self.faults();
            faults.commit_calls += 1;
            if faults.fail_commit {
                return Err(LifecycleDbError::DatabaseError("disk I/O error".into()));
            }
        }
        let mut state = self.state();
        let mut working = state.clone();
        let mut applied = Vec::new();
        for t in transitions {
            let Some(order) = working.orders.get_mut(&t.order.id) else {
                continue;
            };
            if order.status != t.order.status || order.payment_status != t.order.payment_status {
                continue;
            }
            order.status = t.new_status;
            order.payment_status = t.new_payment_status;
            order.updated_at = t.at;
            for n in &t.notifications {
                let id = working.next_id();
                working.notifications.push(Notification {
                    id,
                    user_id: n.user_id,
                    message: n.message.clone(),
                    created_at: t.at,
                    is_read: false,
                });
            }
            applied.push(t.clone());
        }
        *state = working;
        Ok(applied)
    }
}

impl VoucherManagement for MemoryDatabase {
    async fn fetch_active_voucher_by_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Voucher>, VoucherDbError> {
        Ok(self.state().vouchers.values().find(|v| v.code == code && v.is_active_at(now)).cloned())
    }

    async fn fetch_active_vouchers(&self, now: DateTime<Utc>) -> Result<Vec<Voucher>, VoucherDbError> {
        Ok(self.state().vouchers.values().filter(|v| v.is_active_at(now)).cloned().collect())
    }

    async fn fetch_voucher_by_id(&self, id: i64) -> Result<Option<Voucher>, VoucherDbError> {
        Ok(self.voucher(id))
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, VoucherDbError> {
        Ok(self.state().users.get(&user_id).cloned())
    }

    async fn count_orders_for_user(&self, user_id: i64) -> Result<i64, VoucherDbError> {
        let state = self.state();
        let count = state
            .orders
            .values()
            .filter(|o| o.user_id == user_id && o.status != OrderStatusType::Cancelled)
            .count();
        Ok(count as i64)
    }

    async fn voucher_code_exists(&self, code: &str, excluding: Option<i64>) -> Result<bool, VoucherDbError> {
        Ok(self.state().vouchers.values().any(|v| v.code == code && Some(v.id) != excluding))
    }

    async fn insert_voucher(&self, voucher: NewVoucher, now: DateTime<Utc>) -> Result<Voucher, VoucherDbError> {
        let mut state = self.state();
        if state.vouchers.values().any(|v| v.code == voucher.code) {
            return Err(VoucherDbError::DuplicateCode(voucher.code));
        }
        let id = state.next_id();
        let voucher = Self::build_voucher(&mut state, id, voucher, now, now);
        state.vouchers.insert(id, voucher.clone());
        Ok(voucher)
    }

    async fn update_voucher(
        &self,
        id: i64,
        voucher: NewVoucher,
        now: DateTime<Utc>,
    ) -> Result<Option<Voucher>, VoucherDbError> {
        let mut state = self.state();
        let Some(created_at) = state.vouchers.get(&id).map(|v| v.created_at) else {
            return Ok(None);
        };
        if state.vouchers.values().any(|v| v.code == voucher.code && v.id != id) {
            return Err(VoucherDbError::DuplicateCode(voucher.code));
        }
        let voucher = Self::build_voucher(&mut state, id, voucher, created_at, now);
        state.vouchers.insert(id, voucher.clone());
        Ok(Some(voucher))
    }

    async fn delete_voucher(&self, id: i64) -> Result<bool, VoucherDbError> {
        Ok(self.state().vouchers.remove(&id).is_some())
    }

    async fn decrement_usage_limit(&self, id: i64, now: DateTime<Utc>) -> Result<UsageOutcome, VoucherDbError> {
        let mut state = self.state();
        let Some(voucher) = state.vouchers.get_mut(&id) else {
            return Ok(UsageOutcome::NotFound);
        };
        let outcome = match voucher.usage_limit {
            None => UsageOutcome::Unlimited,
            Some(n) if n <= 0 => UsageOutcome::Exhausted,
            Some(n) => {
                voucher.usage_limit = Some(n - 1);
                voucher.updated_at = now;
                UsageOutcome::Remaining(n - 1)
            },
        };
        Ok(outcome)
    }
}
