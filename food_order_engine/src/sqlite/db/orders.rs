use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderDetail},
    traits::{OrderQueryFilter, OrderTransition},
};

/// Inserts a new order and its lines using the given connection. This is not atomic. You can embed this call inside a
/// transaction if you need to ensure atomicity, and pass `&mut tx` as the connection argument.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let inserted: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                user_id,
                restaurant_id,
                delivery_person_id,
                status,
                payment_status,
                payment_method,
                total_amount,
                order_date,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *;
        "#,
    )
    .bind(order.user_id)
    .bind(order.restaurant_id)
    .bind(order.delivery_person_id)
    .bind(order.status)
    .bind(order.payment_status)
    .bind(order.payment_method)
    .bind(order.total_amount)
    .bind(order.order_date)
    .fetch_one(&mut *conn)
    .await?;
    for detail in order.details {
        sqlx::query("INSERT INTO order_details (order_id, product_id, quantity, unit_price) VALUES ($1, $2, $3, $4)")
            .bind(inserted.id)
            .bind(detail.product_id)
            .bind(detail.quantity)
            .bind(detail.unit_price)
            .execute(&mut *conn)
            .await?;
    }
    debug!("🗃️ Order #{} inserted for user #{}", inserted.id, inserted.user_id);
    Ok(inserted)
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_details(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderDetail>, sqlx::Error> {
    let details =
        sqlx::query_as("SELECT * FROM order_details WHERE order_id = $1 ORDER BY id").bind(order_id).fetch_all(conn).await?;
    Ok(details)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `order_date` in ascending order
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT * FROM orders
    "#,
    );
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if !query.statuses.is_empty() {
        let statuses = query.statuses.iter().map(|s| format!("'{s}'")).collect::<Vec<_>>().join(",");
        where_clause.push(format!("status IN ({statuses})"));
    }
    if !query.payment_statuses.is_empty() {
        let statuses = query.payment_statuses.iter().map(|s| format!("'{s}'")).collect::<Vec<_>>().join(",");
        where_clause.push(format!("payment_status IN ({statuses})"));
    }
    if query.unassigned_only {
        where_clause.push("delivery_person_id IS NULL");
    }
    if let Some(cutoff) = query.placed_before {
        where_clause.push("julianday(order_date) < julianday(");
        where_clause.push_bind_unseparated(cutoff);
        where_clause.push_unseparated(")");
    }
    builder.push(" ORDER BY order_date ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {:?}", orders.len());
    Ok(orders)
}

/// Applies the transition if the order still has the status and payment status it was planned from.
///
/// Returns false, and changes nothing, if the order has moved on in the meantime.
pub async fn apply_transition(transition: &OrderTransition, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE orders SET status = $1, payment_status = $2, updated_at = $3
            WHERE id = $4 AND status = $5 AND payment_status = $6
        "#,
    )
    .bind(transition.new_status)
    .bind(transition.new_payment_status)
    .bind(transition.at)
    .bind(transition.order.id)
    .bind(transition.order.status)
    .bind(transition.order.payment_status)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// The number of orders the user has placed that were not cancelled.
pub async fn count_active_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1 AND status != 'Cancelled'")
        .bind(user_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}
