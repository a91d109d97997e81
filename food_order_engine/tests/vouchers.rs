use chrono::{DateTime, Duration, TimeZone, Utc};
use food_order_engine::{
    db_types::{
        ApplyMode,
        ConditionField,
        ConditionOperator,
        ConditionType,
        NewOrder,
        NewUser,
        NewVoucher,
        NewVoucherCondition,
        User,
        VoucherCategory,
        VoucherStatus,
        VoucherType,
        Vnd,
    },
    test_utils::{prepare_test_env, random_db_path, ManualClock},
    traits::UsageOutcome,
    SqliteDatabase,
    VoucherAdminError,
    VoucherApi,
};
use log::*;
use rust_decimal::Decimal;
use sqlx::{migrate::MigrateDatabase, Sqlite};

type Api = VoucherApi<SqliteDatabase, ManualClock>;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 5, 6, 0, 0).unwrap()
}

async fn setup() -> (SqliteDatabase, Api) {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let api = VoucherApi::new_with_clock(db.clone(), ManualClock::new(now()));
    (db, api)
}

async fn tear_down(db: SqliteDatabase) {
    db.close().await;
    if let Err(e) = Sqlite::drop_database(db.url()).await {
        error!("🚀️ Failed to drop database: {e}");
    }
}

async fn customer(db: &SqliteDatabase, role: &str, joined_days_ago: i64) -> User {
    let user = NewUser::new("Thu", role).joined_at(now() - Duration::days(joined_days_ago));
    db.insert_user(user).await.expect("Error inserting user")
}

fn save10() -> NewVoucher {
    NewVoucher::new("SAVE10", VoucherType::Percentage, Decimal::from(10), now() + Duration::days(30))
        .with_minimum_order(Vnd::from(50_000))
        .with_usage_limit(5)
}

fn user_condition(field: ConditionField, op: ConditionOperator, value: &str) -> NewVoucherCondition {
    NewVoucherCondition::new(ConditionType::User, field, op, value)
}

#[tokio::test]
async fn save10_on_a_large_order() {
    let (db, api) = setup().await;
    let user = customer(&db, "Customer", 10).await;
    let created = api.create_voucher(save10()).await.unwrap();
    let result = api.validate_for_order("SAVE10", user.id, Vnd::from(200_000), 1, &[]).await;
    assert!(result.is_valid);
    assert_eq!(result.message, "Voucher is valid");
    assert_eq!(result.discount, Vnd::from(20_000));
    assert_eq!(result.voucher, Some(created));
    // Validation is read-only, so asking again gives the same answer
    let again = api.validate_for_order("SAVE10", user.id, Vnd::from(200_000), 1, &[]).await;
    assert_eq!((again.is_valid, again.discount), (result.is_valid, result.discount));
    tear_down(db).await;
}

#[tokio::test]
async fn save10_below_the_minimum() {
    let (db, api) = setup().await;
    let user = customer(&db, "Customer", 10).await;
    api.create_voucher(save10()).await.unwrap();
    let result = api.validate_for_order("SAVE10", user.id, Vnd::from(30_000), 1, &[]).await;
    assert!(!result.is_valid);
    assert!(result.message.contains("50,000"));
    assert!(result.discount.is_zero());
    assert!(result.voucher.is_none());
    tear_down(db).await;
}

#[tokio::test]
async fn unknown_expired_and_inactive_codes_are_invalid() {
    let (db, api) = setup().await;
    let user = customer(&db, "Customer", 10).await;
    let expired = NewVoucher::new("OLD", VoucherType::Fixed, Decimal::from(5_000), now() - Duration::seconds(1));
    api.create_voucher(expired).await.unwrap();
    let inactive = NewVoucher::new("PAUSED", VoucherType::Fixed, Decimal::from(5_000), now() + Duration::days(1))
        .with_status(VoucherStatus::Inactive);
    api.create_voucher(inactive).await.unwrap();
    for code in ["NOPE", "OLD", "PAUSED"] {
        let result = api.validate_for_order(code, user.id, Vnd::from(100_000), 1, &[]).await;
        assert_eq!(result.message, "Invalid or expired voucher code", "code {code}");
    }
    let result = api.validate_for_order("save10", 9999, Vnd::from(100_000), 1, &[]).await;
    assert_eq!(result.message, "Invalid or expired voucher code");
    api.create_voucher(save10()).await.unwrap();
    let result = api.validate_for_order("save10", 9999, Vnd::from(100_000), 1, &[]).await;
    assert_eq!(result.message, "User not found");
    tear_down(db).await;
}

#[tokio::test]
async fn percentage_cap_and_fixed_amounts() {
    let (db, api) = setup().await;
    let user = customer(&db, "Customer", 10).await;
    let half = NewVoucher::new("HALF", VoucherType::Percentage, Decimal::from(50), now() + Duration::days(1))
        .with_maximum_discount(Vnd::from(20_000));
    api.create_voucher(half).await.unwrap();
    let flat = NewVoucher::new("FLAT10K", VoucherType::Fixed, Decimal::from(10_000), now() + Duration::days(1))
        .with_minimum_order(Vnd::from(20_000));
    api.create_voucher(flat).await.unwrap();

    let result = api.validate_for_order("HALF", user.id, Vnd::from(100_000), 1, &[]).await;
    assert_eq!(result.discount, Vnd::from(20_000));
    for total in [20_000, 55_000, 1_000_000] {
        let result = api.validate_for_order("FLAT10K", user.id, Vnd::from(total), 1, &[]).await;
        assert!(result.is_valid);
        assert_eq!(result.discount, Vnd::from(10_000));
    }
    tear_down(db).await;
}

#[tokio::test]
async fn scoped_vouchers_check_ownership() {
    let (db, api) = setup().await;
    let alice = customer(&db, "Customer", 10).await;
    let bob = customer(&db, "Customer", 10).await;
    let expires = now() + Duration::days(3);
    let personal = NewVoucher::new("ALICE5", VoucherType::Fixed, Decimal::from(5_000), expires).for_user(alice.id);
    let restaurant = NewVoucher::new("PHO", VoucherType::Fixed, Decimal::from(5_000), expires)
        .with_category(VoucherCategory::Restaurant)
        .for_restaurant(12);
    let product = NewVoucher::new("BANHMI", VoucherType::Fixed, Decimal::from(5_000), expires)
        .with_category(VoucherCategory::Product)
        .for_product(300);
    for v in [personal, restaurant, product] {
        api.create_voucher(v).await.unwrap();
    }
    let total = Vnd::from(80_000);
    assert!(api.validate_for_order("ALICE5", alice.id, total, 1, &[]).await.is_valid);
    let msg = api.validate_for_order("ALICE5", bob.id, total, 1, &[]).await.message;
    assert_eq!(msg, "This voucher does not belong to you");
    assert!(api.validate_for_order("PHO", bob.id, total, 12, &[]).await.is_valid);
    let msg = api.validate_for_order("PHO", bob.id, total, 13, &[]).await.message;
    assert_eq!(msg, "This voucher is not valid for this restaurant");
    assert!(api.validate_for_order("BANHMI", bob.id, total, 1, &[100, 300]).await.is_valid);
    let msg = api.validate_for_order("BANHMI", bob.id, total, 1, &[100]).await.message;
    assert_eq!(msg, "This voucher is not valid for the products in your order");
    tear_down(db).await;
}

#[tokio::test]
async fn all_conditions_must_hold() {
    let (db, api) = setup().await;
    let vip = customer(&db, "VIP", 400).await;
    for _ in 0..3 {
        db.insert_order(NewOrder::new(vip.id, 1, Vnd::from(50_000))).await.unwrap();
    }
    let loyal = NewVoucher::new("LOYAL", VoucherType::Fixed, Decimal::from(15_000), now() + Duration::days(7))
        .with_apply_mode(ApplyMode::Condition)
        .with_condition(user_condition(ConditionField::TotalOrders, ConditionOperator::Gte, "3"))
        .with_condition(user_condition(ConditionField::UserCategory, ConditionOperator::In, r#"["VIP","Gold"]"#));
    let picky = NewVoucher::new("PICKY", VoucherType::Fixed, Decimal::from(15_000), now() + Duration::days(7))
        .with_apply_mode(ApplyMode::Condition)
        .with_condition(user_condition(ConditionField::TotalOrders, ConditionOperator::Gte, "3"))
        .with_condition(user_condition(ConditionField::UserCategory, ConditionOperator::Eq, "Gold"));
    api.create_voucher(loyal).await.unwrap();
    api.create_voucher(picky).await.unwrap();

    assert!(api.validate_for_order("LOYAL", vip.id, Vnd::from(60_000), 1, &[]).await.is_valid);
    let result = api.validate_for_order("PICKY", vip.id, Vnd::from(60_000), 1, &[]).await;
    assert!(!result.is_valid);
    assert_eq!(result.message, "You are not eligible to use this voucher");

    let listed = api.list_eligible_vouchers(vip.id).await;
    assert!(listed.success);
    let codes = listed.vouchers.iter().map(|v| v.code.as_str()).collect::<Vec<_>>();
    assert_eq!(codes, vec!["LOYAL"]);
    tear_down(db).await;
}

#[tokio::test]
async fn eligible_voucher_listing() {
    let (db, api) = setup().await;
    let newbie = customer(&db, "Customer", 2).await;
    let other = customer(&db, "Customer", 2).await;
    let expires = now() + Duration::days(5);
    let vouchers = vec![
        NewVoucher::new("PUBLIC", VoucherType::Fixed, Decimal::from(1_000), expires),
        NewVoucher::new("MINE", VoucherType::Fixed, Decimal::from(1_000), expires).for_user(newbie.id),
        NewVoucher::new("THEIRS", VoucherType::Fixed, Decimal::from(1_000), expires).for_user(other.id),
        NewVoucher::new("SHIPFREE", VoucherType::Fixed, Decimal::from(15_000), expires)
            .with_apply_mode(ApplyMode::Condition)
            .with_category(VoucherCategory::FreeShipping),
        NewVoucher::new("NOCONDS", VoucherType::Fixed, Decimal::from(1_000), expires)
            .with_apply_mode(ApplyMode::Condition),
        NewVoucher::new("NEWCOMER", VoucherType::Fixed, Decimal::from(1_000), expires)
            .with_apply_mode(ApplyMode::Condition)
            .with_condition(user_condition(ConditionField::JoinDate, ConditionOperator::Gt, "2024-10-01"))
            .with_condition(NewVoucherCondition::new(
                ConditionType::Order,
                ConditionField::TotalAmount,
                ConditionOperator::Gte,
                "100000",
            )),
        NewVoucher::new("LAPSED", VoucherType::Fixed, Decimal::from(1_000), now() - Duration::days(1)),
    ];
    for v in vouchers {
        api.create_voucher(v).await.unwrap();
    }
    let listed = api.list_eligible_vouchers(newbie.id).await;
    assert!(listed.success);
    let mut codes = listed.vouchers.iter().map(|v| v.code.clone()).collect::<Vec<_>>();
    codes.sort();
    assert_eq!(codes, vec!["MINE", "NEWCOMER", "PUBLIC", "SHIPFREE"]);
    let newcomer = listed.vouchers.iter().find(|v| v.code == "NEWCOMER").unwrap();
    assert_eq!(newcomer.conditions.len(), 2);
    tear_down(db).await;
}

#[tokio::test]
async fn order_level_conditions_are_checked_after_checkout() {
    let (db, api) = setup().await;
    let user = customer(&db, "Customer", 30).await;
    let combo = NewVoucher::new("COMBO", VoucherType::Fixed, Decimal::from(20_000), now() + Duration::days(2))
        .with_apply_mode(ApplyMode::Condition)
        .with_condition(NewVoucherCondition::new(
            ConditionType::Product,
            ConditionField::MinimumQuantity,
            ConditionOperator::Gte,
            "7|2",
        ))
        .with_condition(NewVoucherCondition::new(
            ConditionType::Product,
            ConditionField::ProductId,
            ConditionOperator::Excludes,
            "8",
        ))
        .with_condition(NewVoucherCondition::new(
            ConditionType::Order,
            ConditionField::TotalAmount,
            ConditionOperator::Gt,
            "60000",
        ));
    let voucher = api.create_voucher(combo).await.unwrap();

    let good = NewOrder::new(user.id, 1, Vnd::from(90_000))
        .placed_at(now())
        .with_detail(7, 1, Vnd::from(30_000))
        .with_detail(7, 1, Vnd::from(30_000))
        .with_detail(5, 1, Vnd::from(30_000));
    let good = db.insert_order(good).await.unwrap();
    let details = db.fetch_order_details(good.id).await.unwrap();
    assert!(api.evaluate_order_voucher_conditions(&voucher, &good, &details));

    let bad = NewOrder::new(user.id, 1, Vnd::from(90_000))
        .placed_at(now())
        .with_detail(7, 2, Vnd::from(30_000))
        .with_detail(8, 1, Vnd::from(30_000));
    let bad = db.insert_order(bad).await.unwrap();
    let details = db.fetch_order_details(bad.id).await.unwrap();
    assert!(!api.evaluate_order_voucher_conditions(&voucher, &bad, &details));
    tear_down(db).await;
}

#[tokio::test]
async fn admin_crud() {
    let (db, api) = setup().await;
    let created = api
        .create_voucher(
            NewVoucher::new(" autumn24 ", VoucherType::Fixed, Decimal::from(5_000), now() + Duration::days(10))
                .with_condition(user_condition(ConditionField::TotalOrders, ConditionOperator::Gt, "0")),
        )
        .await
        .unwrap();
    assert_eq!(created.code, "AUTUMN24");
    assert_eq!(created.conditions.len(), 1);
    assert_eq!(created.created_at, now());

    let dup = NewVoucher::new("AUTUMN24", VoucherType::Fixed, Decimal::from(1), now() + Duration::days(1));
    assert!(matches!(api.create_voucher(dup).await, Err(VoucherAdminError::DuplicateCode(_))));

    let other = api
        .create_voucher(NewVoucher::new("WINTER24", VoucherType::Fixed, Decimal::from(5_000), now() + Duration::days(10)))
        .await
        .unwrap();
    let clash = NewVoucher::new("AUTUMN24", VoucherType::Fixed, Decimal::from(1), now() + Duration::days(1));
    assert!(matches!(api.update_voucher(other.id, clash).await, Err(VoucherAdminError::DuplicateCode(_))));

    let changed = NewVoucher::new("AUTUMN24", VoucherType::Percentage, Decimal::new(125, 1), now() + Duration::days(20))
        .with_maximum_discount(Vnd::from(30_000))
        .with_condition(user_condition(ConditionField::UserCategory, ConditionOperator::Eq, "VIP"))
        .with_condition(user_condition(ConditionField::JoinDate, ConditionOperator::Lt, "2024-01-01"));
    let updated = api.update_voucher(created.id, changed).await.unwrap();
    assert_eq!(updated.discount_amount, Decimal::new(125, 1));
    assert_eq!(updated.voucher_type, VoucherType::Percentage);
    assert_eq!(updated.conditions.len(), 2);
    assert!(updated.conditions.iter().all(|c| c.voucher_id == created.id));
    assert_eq!(updated.created_at, created.created_at);

    let missing = NewVoucher::new("GHOST", VoucherType::Fixed, Decimal::from(1), now() + Duration::days(1));
    assert!(matches!(api.update_voucher(9999, missing).await, Err(VoucherAdminError::VoucherNotFound(9999))));

    api.delete_voucher(created.id).await.unwrap();
    assert!(matches!(api.delete_voucher(created.id).await, Err(VoucherAdminError::VoucherNotFound(_))));
    let user = customer(&db, "VIP", 500).await;
    let result = api.validate_for_order("AUTUMN24", user.id, Vnd::from(100_000), 1, &[]).await;
    assert!(!result.is_valid);
    tear_down(db).await;
}

async fn reject_condition_inserts(db: &SqliteDatabase) {
    sqlx::query(
        r#"
            CREATE TRIGGER reject_voucher_conditions BEFORE INSERT ON voucher_conditions
            BEGIN
                SELECT RAISE(ABORT, 'voucher_conditions is read-only');
            END;
        "#,
    )
    .execute(db.pool())
    .await
    .expect("Error creating trigger");
}

async fn allow_condition_inserts(db: &SqliteDatabase) {
    sqlx::query("DROP TRIGGER reject_voucher_conditions").execute(db.pool()).await.expect("Error dropping trigger");
}

async fn count_rows(db: &SqliteDatabase, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}")).fetch_one(db.pool()).await.expect("Error counting rows")
}

#[tokio::test]
async fn failed_condition_insert_rolls_back_the_new_voucher() {
    let (db, api) = setup().await;
    reject_condition_inserts(&db).await;
    let voucher = save10().with_condition(user_condition(ConditionField::TotalOrders, ConditionOperator::Gte, "1"));
    let err = api.create_voucher(voucher).await.unwrap_err();
    assert!(matches!(err, VoucherAdminError::DatabaseError(_)), "{err}");
    assert_eq!(count_rows(&db, "vouchers").await, 0);
    assert_eq!(count_rows(&db, "voucher_conditions").await, 0);

    // Once conditions can be stored again, the same code is free to use
    allow_condition_inserts(&db).await;
    let voucher = save10().with_condition(user_condition(ConditionField::TotalOrders, ConditionOperator::Gte, "1"));
    let created = api.create_voucher(voucher).await.unwrap();
    assert_eq!(created.conditions.len(), 1);
    tear_down(db).await;
}

#[tokio::test]
async fn failed_condition_insert_keeps_the_old_voucher() {
    let (db, api) = setup().await;
    let original = api
        .create_voucher(save10().with_condition(user_condition(ConditionField::UserCategory, ConditionOperator::Eq, "VIP")))
        .await
        .unwrap();
    reject_condition_inserts(&db).await;
    let replacement = NewVoucher::new("SAVE20", VoucherType::Fixed, Decimal::from(20_000), now() + Duration::days(5))
        .with_condition(user_condition(ConditionField::TotalOrders, ConditionOperator::Gt, "3"))
        .with_condition(user_condition(ConditionField::JoinDate, ConditionOperator::Lt, "2024-06-01"));
    let err = api.update_voucher(original.id, replacement).await.unwrap_err();
    assert!(matches!(err, VoucherAdminError::DatabaseError(_)), "{err}");
    allow_condition_inserts(&db).await;

    let kept = api.fetch_voucher(original.id).await.unwrap();
    assert_eq!(kept, original);
    assert_eq!(kept.code, "SAVE10");
    assert_eq!(kept.conditions.len(), 1);
    assert_eq!(kept.conditions[0].field, ConditionField::UserCategory);
    assert_eq!(count_rows(&db, "voucher_conditions").await, 1);
    tear_down(db).await;
}

#[tokio::test]
async fn redemption_counts_down_to_zero() {
    let (db, api) = setup().await;
    let user = customer(&db, "Customer", 10).await;
    let twice = NewVoucher::new("TWICE", VoucherType::Fixed, Decimal::from(2_000), now() + Duration::days(1))
        .with_usage_limit(2);
    let twice = api.create_voucher(twice).await.unwrap();
    assert_eq!(api.redeem_voucher(twice.id).await.unwrap(), UsageOutcome::Remaining(1));
    assert_eq!(api.redeem_voucher(twice.id).await.unwrap(), UsageOutcome::Remaining(0));
    assert!(matches!(api.redeem_voucher(twice.id).await, Err(VoucherAdminError::UsageLimitReached(_))));
    let result = api.validate_for_order("TWICE", user.id, Vnd::from(10_000), 1, &[]).await;
    assert_eq!(result.message, "This voucher has reached its usage limit");

    let unlimited = NewVoucher::new("ALWAYS", VoucherType::Fixed, Decimal::from(2_000), now() + Duration::days(1));
    let unlimited = api.create_voucher(unlimited).await.unwrap();
    assert_eq!(api.redeem_voucher(unlimited.id).await.unwrap(), UsageOutcome::Unlimited);
    assert!(matches!(api.redeem_voucher(424242).await, Err(VoucherAdminError::VoucherNotFound(_))));
    tear_down(db).await;
}

#[tokio::test]
async fn generated_codes_are_unused() {
    let (db, api) = setup().await;
    let code = api.generate_unique_voucher_code().await.unwrap();
    assert_eq!(code.len(), 8);
    assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    let voucher = NewVoucher::new(code.clone(), VoucherType::Fixed, Decimal::from(1_000), now() + Duration::days(1));
    assert_eq!(api.create_voucher(voucher).await.unwrap().code, code);
    tear_down(db).await;
}
