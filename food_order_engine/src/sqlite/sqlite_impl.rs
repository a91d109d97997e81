//! `SqliteDatabase` is a concrete implementation of a food order engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`] module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{db_url, new_pool, notifications, orders, users, vouchers};
use crate::{
    db_types::{NewOrder, NewUser, NewVoucher, Notification, Order, OrderDetail, User, Voucher},
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

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderLifecycleDatabase for SqliteDatabase {
    async fn fetch_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, LifecycleDbError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    /// Applies every transition in a single transaction. Each order is only updated if its status and payment status
    /// are still what the transition expects, and its notifications are only stored if the update happened.
    /// Any SQL error rolls back the whole batch.
    async fn commit_transitions(
        &self,
        transitions: &[OrderTransition],
    ) -> Result<Vec<OrderTransition>, LifecycleDbError> {
        let mut tx = self.pool.begin().await?;
        let mut applied = Vec::with_capacity(transitions.len());
        for transition in transitions {
            if !orders::apply_transition(transition, &mut tx).await? {
                debug!("🗃️ Order #{} was modified concurrently. Skipping {transition}", transition.order_id());
                continue;
            }
            for notification in &transition.notifications {
                notifications::insert_notification(notification, transition.at, &mut tx).await?;
            }
            applied.push(transition.clone());
        }
        tx.commit().await?;
        trace!("🗃️ {} of {} order transitions committed", applied.len(), transitions.len());
        Ok(applied)
    }
}

impl VoucherManagement for SqliteDatabase {
    async fn fetch_active_voucher_by_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Voucher>, VoucherDbError> {
        let mut conn = self.pool.acquire().await?;
        vouchers::fetch_active_voucher_by_code(code, now, &mut conn).await
    }

    async fn fetch_active_vouchers(&self, now: DateTime<Utc>) -> Result<Vec<Voucher>, VoucherDbError> {
        let mut conn = self.pool.acquire().await?;
        vouchers::fetch_active_vouchers(now, &mut conn).await
    }

    async fn fetch_voucher_by_id(&self, id: i64) -> Result<Option<Voucher>, VoucherDbError> {
        let mut conn = self.pool.acquire().await?;
        vouchers::fetch_voucher_by_id(id, &mut conn).await
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, VoucherDbError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_id(user_id, &mut conn).await?;
        Ok(user)
    }

    async fn count_orders_for_user(&self, user_id: i64) -> Result<i64, VoucherDbError> {
        let mut conn = self.pool.acquire().await?;
        let count = orders::count_active_orders_for_user(user_id, &mut conn).await?;
        Ok(count)
    }

    async fn voucher_code_exists(&self, code: &str, excluding: Option<i64>) -> Result<bool, VoucherDbError> {
        let mut conn = self.pool.acquire().await?;
        let exists = vouchers::code_exists(code, excluding, &mut conn).await?;
        Ok(exists)
    }

    async fn insert_voucher(&self, voucher: NewVoucher, now: DateTime<Utc>) -> Result<Voucher, VoucherDbError> {
        let mut tx = self.pool.begin().await?;
        let id = vouchers::insert_voucher(&voucher, now, &mut tx).await?;
        let inserted = vouchers::fetch_voucher_by_id(id, &mut tx)
            .await?
            .ok_or_else(|| VoucherDbError::InvalidRecord(format!("Voucher #{id} vanished after it was inserted")))?;
        tx.commit().await?;
        Ok(inserted)
    }

    async fn update_voucher(
        &self,
        id: i64,
        voucher: NewVoucher,
        now: DateTime<Utc>,
    ) -> Result<Option<Voucher>, VoucherDbError> {
        let mut tx = self.pool.begin().await?;
        if !vouchers::update_voucher(id, &voucher, now, &mut tx).await? {
            return Ok(None);
        }
        let updated = vouchers::fetch_voucher_by_id(id, &mut tx).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn delete_voucher(&self, id: i64) -> Result<bool, VoucherDbError> {
        let mut tx = self.pool.begin().await?;
        let deleted = vouchers::delete_voucher(id, &mut tx).await?;
        tx.commit().await?;
        Ok(deleted)
    }

    async fn decrement_usage_limit(&self, id: i64, now: DateTime<Utc>) -> Result<UsageOutcome, VoucherDbError> {
        let mut tx = self.pool.begin().await?;
        let outcome = vouchers::decrement_usage_limit(id, now, &mut tx).await?;
        tx.commit().await?;
        Ok(outcome)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date using the migrations embedded in this crate.
    pub async fn run_migrations(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Stores a new order and its lines in one transaction.
    pub async fn insert_order(&self, order: NewOrder) -> Result<Order, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    pub async fn insert_user(&self, user: NewUser) -> Result<User, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(user, &mut conn).await
    }

    pub async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_id(id, &mut conn).await
    }

    pub async fn fetch_order_details(&self, order_id: i64) -> Result<Vec<OrderDetail>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_details(order_id, &mut conn).await
    }

    pub async fn fetch_notifications_for_user(&self, user_id: i64) -> Result<Vec<Notification>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        notifications::fetch_notifications_for_user(user_id, &mut conn).await
    }

    pub async fn count_notifications(&self) -> Result<i64, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        notifications::count_notifications(&mut conn).await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
