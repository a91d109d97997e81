use std::{collections::HashMap, str::FromStr};

use chrono::{DateTime, Utc};
use log::{debug, trace};
use rust_decimal::Decimal;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{
        ApplyMode,
        NewVoucher,
        NewVoucherCondition,
        Vnd,
        Voucher,
        VoucherCategory,
        VoucherCondition,
        VoucherStatus,
        VoucherType,
    },
    traits::{UsageOutcome, VoucherDbError},
};

/// A row of the `vouchers` table. The discount is stored as text and parsed on the way out.
#[derive(Debug, Clone, FromRow)]
struct VoucherRow {
    id: i64,
    code: String,
    voucher_type: VoucherType,
    discount_amount: String,
    minimum_order_amount: Option<Vnd>,
    maximum_discount_amount: Option<Vnd>,
    usage_limit: Option<i64>,
    expiration_date: DateTime<Utc>,
    status: VoucherStatus,
    apply_mode: ApplyMode,
    category: VoucherCategory,
    user_id: Option<i64>,
    restaurant_id: Option<i64>,
    product_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct ConditionRow {
    id: i64,
    voucher_id: i64,
    condition_type: String,
    field: String,
    operator: String,
    value: String,
}

impl From<ConditionRow> for VoucherCondition {
    fn from(row: ConditionRow) -> Self {
        Self {
            id: row.id,
            voucher_id: row.voucher_id,
            condition_type: row.condition_type.into(),
            field: row.field.into(),
            operator: row.operator.into(),
            value: row.value,
        }
    }
}

impl VoucherRow {
    fn into_voucher(self, conditions: Vec<VoucherCondition>) -> Result<Voucher, VoucherDbError> {
        let discount_amount = Decimal::from_str(&self.discount_amount).map_err(|e| {
            VoucherDbError::InvalidRecord(format!(
                "Voucher #{} has discount '{}'. {e}",
                self.id, self.discount_amount
            ))
        })?;
        Ok(Voucher {
            id: self.id,
            code: self.code,
            voucher_type: self.voucher_type,
            discount_amount,
            minimum_order_amount: self.minimum_order_amount,
            maximum_discount_amount: self.maximum_discount_amount,
            usage_limit: self.usage_limit,
            expiration_date: self.expiration_date,
            status: self.status,
            apply_mode: self.apply_mode,
            category: self.category,
            user_id: self.user_id,
            restaurant_id: self.restaurant_id,
            product_id: self.product_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            conditions,
        })
    }
}

/// Loads the conditions of every given voucher in one query and assembles the vouchers.
async fn attach_conditions(rows: Vec<VoucherRow>, conn: &mut SqliteConnection) -> Result<Vec<Voucher>, VoucherDbError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids = rows.iter().map(|r| r.id.to_string()).collect::<Vec<_>>().join(",");
    let q = format!("SELECT * FROM voucher_conditions WHERE voucher_id IN ({ids}) ORDER BY id");
    let conditions: Vec<ConditionRow> = sqlx::query_as(&q).fetch_all(conn).await?;
    let mut by_voucher: HashMap<i64, Vec<VoucherCondition>> = HashMap::new();
    for row in conditions {
        by_voucher.entry(row.voucher_id).or_default().push(row.into());
    }
    rows.into_iter()
        .map(|row| {
            let conditions = by_voucher.remove(&row.id).unwrap_or_default();
            row.into_voucher(conditions)
        })
        .collect()
}

pub async fn fetch_active_voucher_by_code(
    code: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Voucher>, VoucherDbError> {
    let row: Option<VoucherRow> = sqlx::query_as(
        r#"
            SELECT * FROM vouchers
            WHERE code = $1 AND status = 'Active' AND julianday(expiration_date) > julianday($2)
        "#,
    )
    .bind(code)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;
    match row {
        Some(row) => Ok(attach_conditions(vec![row], conn).await?.pop()),
        None => Ok(None),
    }
}

pub async fn fetch_active_vouchers(
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Voucher>, VoucherDbError> {
    let rows: Vec<VoucherRow> = sqlx::query_as(
        r#"
            SELECT * FROM vouchers
            WHERE status = 'Active' AND julianday(expiration_date) > julianday($1)
            ORDER BY expiration_date ASC
        "#,
    )
    .bind(now)
    .fetch_all(&mut *conn)
    .await?;
    trace!("🗃️ {} active vouchers fetched", rows.len());
    attach_conditions(rows, conn).await
}

pub async fn fetch_voucher_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Voucher>, VoucherDbError> {
    let row: Option<VoucherRow> =
        sqlx::query_as("SELECT * FROM vouchers WHERE id = $1").bind(id).fetch_optional(&mut *conn).await?;
    match row {
        Some(row) => Ok(attach_conditions(vec![row], conn).await?.pop()),
        None => Ok(None),
    }
}

pub async fn code_exists(code: &str, excluding: Option<i64>, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vouchers WHERE code = $1 AND id != $2")
        .bind(code)
        .bind(excluding.unwrap_or(-1))
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

fn map_unique_violation(e: sqlx::Error, code: &str) -> VoucherDbError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            VoucherDbError::DuplicateCode(code.to_string())
        },
        e => e.into(),
    }
}

/// Inserts the voucher and its conditions. Not atomic by itself; run it inside a transaction.
pub async fn insert_voucher(
    voucher: &NewVoucher,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<i64, VoucherDbError> {
    let id: i64 = sqlx::query_scalar(
        r#"
            INSERT INTO vouchers (
                code,
                voucher_type,
                discount_amount,
                minimum_order_amount,
                maximum_discount_amount,
                usage_limit,
                expiration_date,
                status,
                apply_mode,
                category,
                user_id,
                restaurant_id,
                product_id,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14)
            RETURNING id;
        "#,
    )
    .bind(&voucher.code)
    .bind(voucher.voucher_type)
    .bind(voucher.discount_amount.to_string())
    .bind(voucher.minimum_order_amount)
    .bind(voucher.maximum_discount_amount)
    .bind(voucher.usage_limit)
    .bind(voucher.expiration_date)
    .bind(voucher.status)
    .bind(voucher.apply_mode)
    .bind(voucher.category)
    .bind(voucher.user_id)
    .bind(voucher.restaurant_id)
    .bind(voucher.product_id)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| map_unique_violation(e, &voucher.code))?;
    insert_conditions(id, &voucher.conditions, conn).await?;
    debug!("🗃️ Voucher {} inserted with id {id}", voucher.code);
    Ok(id)
}

/// Overwrites the voucher's fields and replaces its conditions. Returns false if the voucher does not exist. Not atomic
/// by itself; run it inside a transaction.
pub async fn update_voucher(
    id: i64,
    voucher: &NewVoucher,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, VoucherDbError> {
    let result = sqlx::query(
        r#"
            UPDATE vouchers SET
                code = $1,
                voucher_type = $2,
                discount_amount = $3,
                minimum_order_amount = $4,
                maximum_discount_amount = $5,
                usage_limit = $6,
                expiration_date = $7,
                status = $8,
                apply_mode = $9,
                category = $10,
                user_id = $11,
                restaurant_id = $12,
                product_id = $13,
                updated_at = $14
            WHERE id = $15
        "#,
    )
    .bind(&voucher.code)
    .bind(voucher.voucher_type)
    .bind(voucher.discount_amount.to_string())
    .bind(voucher.minimum_order_amount)
    .bind(voucher.maximum_discount_amount)
    .bind(voucher.usage_limit)
    .bind(voucher.expiration_date)
    .bind(voucher.status)
    .bind(voucher.apply_mode)
    .bind(voucher.category)
    .bind(voucher.user_id)
    .bind(voucher.restaurant_id)
    .bind(voucher.product_id)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await
    .map_err(|e| map_unique_violation(e, &voucher.code))?;
    if result.rows_affected() == 0 {
        return Ok(false);
    }
    delete_conditions(id, conn).await?;
    insert_conditions(id, &voucher.conditions, conn).await?;
    debug!("🗃️ Voucher #{id} updated with {} conditions", voucher.conditions.len());
    Ok(true)
}

/// Deletes the voucher and its conditions. Returns false if the voucher does not exist.
pub async fn delete_voucher(id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    delete_conditions(id, conn).await?;
    let result = sqlx::query("DELETE FROM vouchers WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

async fn insert_conditions(
    voucher_id: i64,
    conditions: &[NewVoucherCondition],
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    for condition in conditions {
        sqlx::query(
            r#"
                INSERT INTO voucher_conditions (voucher_id, condition_type, field, operator, value)
                VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(voucher_id)
        .bind(condition.condition_type.to_string())
        .bind(condition.field.to_string())
        .bind(condition.operator.to_string())
        .bind(&condition.value)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn delete_conditions(voucher_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM voucher_conditions WHERE voucher_id = $1").bind(voucher_id).execute(conn).await?;
    Ok(())
}

/// Consumes one use of the voucher. The usage limit never drops below zero.
pub async fn decrement_usage_limit(
    id: i64,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<UsageOutcome, sqlx::Error> {
    let limit: Option<Option<i64>> =
        sqlx::query_scalar("SELECT usage_limit FROM vouchers WHERE id = $1").bind(id).fetch_optional(&mut *conn).await?;
    let outcome = match limit {
        None => UsageOutcome::NotFound,
        Some(None) => UsageOutcome::Unlimited,
        Some(Some(n)) if n <= 0 => UsageOutcome::Exhausted,
        Some(Some(_)) => {
            let remaining: Option<i64> = sqlx::query_scalar(
                r#"
                    UPDATE vouchers SET usage_limit = usage_limit - 1, updated_at = $2
                    WHERE id = $1 AND usage_limit > 0
                    RETURNING usage_limit
                "#,
            )
            .bind(id)
            .bind(now)
            .fetch_optional(conn)
            .await?;
            remaining.map(UsageOutcome::Remaining).unwrap_or(UsageOutcome::Exhausted)
        },
    };
    Ok(outcome)
}
