use std::fmt::Debug;

use log::*;
use rand::Rng;
use regex::Regex;
use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};

use crate::{
    clock::{Clock, LocalTimezone, SystemClock},
    db_types::{ApplyMode, NewVoucher, Order, OrderDetail, User, Vnd, Voucher, VoucherCategory, VoucherType},
    fos_api::{
        conditions::{conditions_hold_for_order, conditions_hold_for_user, UserContext},
        errors::VoucherAdminError,
        voucher_objects::*,
    },
    traits::{UsageOutcome, VoucherDbError, VoucherManagement},
};

pub const VOUCHER_CODE_LENGTH: usize = 8;
const VOUCHER_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const VOUCHER_CODE_PATTERN: &str = r"^[A-Z0-9_-]{3,32}$";
const MAX_CODE_ATTEMPTS: usize = 20;

/// `VoucherApi` decides whether discount codes apply to a user or an order and how much they are worth. It also
/// provides the admin write side for vouchers.
///
/// Validation never fails with an error. Every rejection, including backend failures, is returned as a
/// [`VoucherValidation`] with a message that can be shown to the customer.
pub struct VoucherApi<B, C = SystemClock> {
    db: B,
    clock: C,
    timezone: LocalTimezone,
}

impl<B, C> Debug for VoucherApi<B, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VoucherApi ({})", self.timezone.offset())
    }
}

impl<B> VoucherApi<B, SystemClock> {
    pub fn new(db: B) -> Self {
        Self::new_with_clock(db, SystemClock)
    }
}

impl<B, C> VoucherApi<B, C> {
    pub fn new_with_clock(db: B, clock: C) -> Self {
        Self { db, clock, timezone: LocalTimezone::default() }
    }

    pub fn with_timezone(mut self, timezone: LocalTimezone) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Every voucher category, with its display name.
    pub fn voucher_categories(&self) -> Vec<CategoryInfo> {
        VoucherCategory::ALL.into_iter().map(CategoryInfo::from).collect()
    }

    /// The discount a voucher is worth on an order of the given total.
    ///
    /// Fixed vouchers are worth their face value. Percentage vouchers are worth that percentage of the total, rounded
    /// to the nearest đồng (halves away from zero) and capped at the voucher's maximum discount, if it has one.
    pub fn calculate_discount(&self, voucher: &Voucher, order_total: Vnd) -> Vnd {
        let raw = match voucher.voucher_type {
            VoucherType::Fixed => Some(voucher.discount_amount),
            VoucherType::Percentage => Decimal::from(order_total.value())
                .checked_mul(voucher.discount_amount)
                .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED)),
        };
        let discount = raw
            .map(|d| d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|d| d.to_i64())
            .map(Vnd::from)
            .unwrap_or_else(|| {
                warn!("🎟️ Discount for voucher {} on {order_total} is out of range. No discount applied.", voucher.code);
                Vnd::default()
            });
        match (voucher.voucher_type, voucher.maximum_discount_amount) {
            (VoucherType::Percentage, Some(max)) => discount.min(max),
            _ => discount,
        }
    }

    /// Checks the order- and product-level conditions of a voucher once the order and its lines are known.
    /// A voucher without conditions passes.
    pub fn evaluate_order_voucher_conditions(&self, voucher: &Voucher, order: &Order, details: &[OrderDetail]) -> bool {
        conditions_hold_for_order(&voucher.conditions, order, details, &self.timezone)
    }

    /// Whether a user may redeem the voucher, independent of any particular order.
    pub fn is_eligible(&self, voucher: &Voucher, user: Option<&User>, order_count: i64) -> bool {
        let user_id = user.map(|u| u.id);
        match voucher.apply_mode {
            ApplyMode::Individual => voucher.user_id.is_none() || voucher.user_id == user_id,
            ApplyMode::Condition if voucher.conditions.is_empty() => voucher.category == VoucherCategory::FreeShipping,
            ApplyMode::Condition => {
                let ctx = UserContext::new(user, order_count);
                conditions_hold_for_user(&voucher.conditions, &ctx, &self.timezone)
            },
        }
    }
}

impl<B, C> VoucherApi<B, C>
where
    B: VoucherManagement,
    C: Clock,
{
    /// Lists the active, unexpired vouchers the user is eligible for.
    pub async fn list_eligible_vouchers(&self, user_id: i64) -> EligibleVouchers {
        match self.try_list_eligible_vouchers(user_id).await {
            Ok(vouchers) => {
                debug!("🎟️ {} vouchers are available to user #{user_id}", vouchers.len());
                EligibleVouchers::found(vouchers)
            },
            Err(e) => {
                error!("🎟️ Could not list vouchers for user #{user_id}. {e}");
                EligibleVouchers::failed(format!("Could not load vouchers: {e}"))
            },
        }
    }

    async fn try_list_eligible_vouchers(&self, user_id: i64) -> Result<Vec<Voucher>, VoucherDbError> {
        let now = self.clock.now();
        let vouchers = self.db.fetch_active_vouchers(now).await?;
        let user = self.db.fetch_user(user_id).await?;
        let order_count = match &user {
            Some(u) => self.db.count_orders_for_user(u.id).await?,
            None => 0,
        };
        let eligible = vouchers.into_iter().filter(|v| self.is_eligible(v, user.as_ref(), order_count)).collect();
        Ok(eligible)
    }

    /// Checks whether the voucher code can be applied to an order being checked out, and works out the discount.
    ///
    /// The checks run in order and stop at the first failure:
    /// 1. the code belongs to an active, unexpired voucher,
    /// 2. the user exists,
    /// 3. the voucher belongs to the user, restaurant or one of the products, according to its category,
    /// 4. the voucher's user conditions hold,
    /// 5. the order total meets the voucher's minimum,
    /// 6. the voucher has uses left.
    ///
    /// This method only reads, so calling it repeatedly with the same inputs gives the same answer.
    pub async fn validate_for_order(
        &self,
        code: &str,
        user_id: i64,
        order_total: Vnd,
        restaurant_id: i64,
        product_ids: &[i64],
    ) -> VoucherValidation {
        let result = self.try_validate_for_order(code, user_id, order_total, restaurant_id, product_ids).await;
        match result {
            Ok(validation) => {
                trace!("🎟️ Voucher {code} for user #{user_id}: {}", validation.message);
                validation
            },
            Err(e) => {
                error!("🎟️ Could not validate voucher {code} for user #{user_id}. {e}");
                VoucherValidation::rejected(format!("Could not validate voucher: {e}"))
            },
        }
    }

    async fn try_validate_for_order(
        &self,
        code: &str,
        user_id: i64,
        order_total: Vnd,
        restaurant_id: i64,
        product_ids: &[i64],
    ) -> Result<VoucherValidation, VoucherDbError> {
        let now = self.clock.now();
        let code = normalize_code(code);
        let Some(voucher) = self.db.fetch_active_voucher_by_code(&code, now).await? else {
            return Ok(VoucherValidation::rejected(MSG_INVALID_CODE));
        };
        let Some(user) = self.db.fetch_user(user_id).await? else {
            return Ok(VoucherValidation::rejected(MSG_USER_NOT_FOUND));
        };
        if let Some(msg) = ownership_failure(&voucher, user_id, restaurant_id, product_ids) {
            return Ok(VoucherValidation::rejected(msg));
        }
        if !voucher.conditions.is_empty() {
            let order_count = self.db.count_orders_for_user(user_id).await?;
            let ctx = UserContext::new(Some(&user), order_count);
            if !conditions_hold_for_user(&voucher.conditions, &ctx, &self.timezone) {
                return Ok(VoucherValidation::rejected(MSG_NOT_ELIGIBLE));
            }
        }
        if let Some(minimum) = voucher.minimum_order_amount {
            if order_total < minimum {
                return Ok(VoucherValidation::minimum_not_met(minimum));
            }
        }
        if matches!(voucher.usage_limit, Some(n) if n <= 0) {
            return Ok(VoucherValidation::rejected(MSG_USAGE_LIMIT));
        }
        let discount = self.calculate_discount(&voucher, order_total);
        Ok(VoucherValidation::valid(voucher, discount))
    }

    /// Fetches any voucher by id, along with its conditions, whatever its status or expiry date.
    pub async fn fetch_voucher(&self, id: i64) -> Result<Voucher, VoucherAdminError> {
        self.db.fetch_voucher_by_id(id).await?.ok_or(VoucherAdminError::VoucherNotFound(id))
    }

    /// Stores a new voucher and its conditions. The code is stored in upper case.
    pub async fn create_voucher(&self, voucher: NewVoucher) -> Result<Voucher, VoucherAdminError> {
        let voucher = check_new_voucher(voucher)?;
        if self.db.voucher_code_exists(&voucher.code, None).await? {
            return Err(VoucherAdminError::DuplicateCode(voucher.code));
        }
        let voucher = self.db.insert_voucher(voucher, self.clock.now()).await?;
        info!("🎟️ Voucher {} (#{}) created", voucher.code, voucher.id);
        Ok(voucher)
    }

    /// Replaces every field of the voucher, and its whole set of conditions.
    pub async fn update_voucher(&self, id: i64, voucher: NewVoucher) -> Result<Voucher, VoucherAdminError> {
        let voucher = check_new_voucher(voucher)?;
        if self.db.voucher_code_exists(&voucher.code, Some(id)).await? {
            return Err(VoucherAdminError::DuplicateCode(voucher.code));
        }
        let voucher =
            self.db.update_voucher(id, voucher, self.clock.now()).await?.ok_or(VoucherAdminError::VoucherNotFound(id))?;
        info!("🎟️ Voucher {} (#{id}) updated", voucher.code);
        Ok(voucher)
    }

    pub async fn delete_voucher(&self, id: i64) -> Result<(), VoucherAdminError> {
        if !self.db.delete_voucher(id).await? {
            return Err(VoucherAdminError::VoucherNotFound(id));
        }
        info!("🎟️ Voucher #{id} deleted");
        Ok(())
    }

    /// Generates a random 8-character code of upper-case letters and digits that no voucher uses yet.
    pub async fn generate_unique_voucher_code(&self) -> Result<String, VoucherAdminError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = random_voucher_code();
            if !self.db.voucher_code_exists(&code, None).await? {
                return Ok(code);
            }
            debug!("🎟️ Generated voucher code {code} is taken. Trying again.");
        }
        Err(VoucherAdminError::CodeSpaceExhausted(MAX_CODE_ATTEMPTS))
    }

    /// Consumes one use of the voucher when a checkout redeems it. Vouchers without a usage limit are unaffected.
    pub async fn redeem_voucher(&self, id: i64) -> Result<UsageOutcome, VoucherAdminError> {
        match self.db.decrement_usage_limit(id, self.clock.now()).await? {
            UsageOutcome::NotFound => Err(VoucherAdminError::VoucherNotFound(id)),
            UsageOutcome::Exhausted => Err(VoucherAdminError::UsageLimitReached(id)),
            outcome => {
                debug!("🎟️ Voucher #{id} redeemed. {outcome:?}");
                Ok(outcome)
            },
        }
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Scoping ids are only enforced when the voucher has one for its category.
fn ownership_failure(voucher: &Voucher, user_id: i64, restaurant_id: i64, product_ids: &[i64]) -> Option<&'static str> {
    match voucher.category {
        VoucherCategory::User => voucher.user_id.filter(|id| *id != user_id).map(|_| MSG_NOT_YOUR_VOUCHER),
        VoucherCategory::Restaurant => {
            voucher.restaurant_id.filter(|id| *id != restaurant_id).map(|_| MSG_WRONG_RESTAURANT)
        },
        VoucherCategory::Product => {
            voucher.product_id.filter(|id| !product_ids.contains(id)).map(|_| MSG_WRONG_PRODUCTS)
        },
        VoucherCategory::FreeShipping => None,
    }
}

fn check_new_voucher(mut voucher: NewVoucher) -> Result<NewVoucher, VoucherAdminError> {
    voucher.code = normalize_code(&voucher.code);
    let pattern = Regex::new(VOUCHER_CODE_PATTERN).map_err(|e| VoucherAdminError::InvalidVoucher(e.to_string()))?;
    if !pattern.is_match(&voucher.code) {
        return Err(VoucherAdminError::InvalidVoucher(format!(
            "'{}' is not a valid code. Use 3 to 32 letters, digits, '-' or '_'",
            voucher.code
        )));
    }
    if voucher.discount_amount <= Decimal::ZERO {
        return Err(VoucherAdminError::InvalidVoucher("The discount must be positive".into()));
    }
    if voucher.voucher_type == VoucherType::Percentage && voucher.discount_amount > Decimal::ONE_HUNDRED {
        return Err(VoucherAdminError::InvalidVoucher("A percentage discount cannot exceed 100".into()));
    }
    let negative_amount = [voucher.minimum_order_amount, voucher.maximum_discount_amount]
        .into_iter()
        .flatten()
        .any(|v| v < Vnd::default());
    if negative_amount {
        return Err(VoucherAdminError::InvalidVoucher("Amounts cannot be negative".into()));
    }
    if matches!(voucher.usage_limit, Some(n) if n < 0) {
        return Err(VoucherAdminError::InvalidVoucher("The usage limit cannot be negative".into()));
    }
    Ok(voucher)
}

fn random_voucher_code() -> String {
    let mut rng = rand::thread_rng();
    (0..VOUCHER_CODE_LENGTH)
        .map(|_| VOUCHER_CODE_ALPHABET[rng.gen_range(0..VOUCHER_CODE_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod test {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use mockall::{mock, predicate::eq};

    use super::*;
    use crate::db_types::{ConditionField, ConditionOperator, ConditionType, VoucherCondition, VoucherStatus};

    mock! {
        pub VoucherBackend {}
        impl VoucherManagement for VoucherBackend {
            async fn fetch_active_voucher_by_code(&self, code: &str, now: DateTime<Utc>) -> Result<Option<Voucher>, VoucherDbError>;
            async fn fetch_active_vouchers(&self, now: DateTime<Utc>) -> Result<Vec<Voucher>, VoucherDbError>;
            async fn fetch_voucher_by_id(&self, id: i64) -> Result<Option<Voucher>, VoucherDbError>;
            async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, VoucherDbError>;
            async fn count_orders_for_user(&self, user_id: i64) -> Result<i64, VoucherDbError>;
            async fn voucher_code_exists(&self, code: &str, excluding: Option<i64>) -> Result<bool, VoucherDbError>;
            async fn insert_voucher(&self, voucher: NewVoucher, now: DateTime<Utc>) -> Result<Voucher, VoucherDbError>;
            async fn update_voucher(&self, id: i64, voucher: NewVoucher, now: DateTime<Utc>) -> Result<Option<Voucher>, VoucherDbError>;
            async fn delete_voucher(&self, id: i64) -> Result<bool, VoucherDbError>;
            async fn decrement_usage_limit(&self, id: i64, now: DateTime<Utc>) -> Result<UsageOutcome, VoucherDbError>;
        }
    }

    #[derive(Clone)]
    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 5, 0, 0).unwrap()
    }

    fn voucher(voucher_type: VoucherType, discount: i64) -> Voucher {
        Voucher {
            id: 1,
            code: "SAVE10".into(),
            voucher_type,
            discount_amount: Decimal::from(discount),
            minimum_order_amount: None,
            maximum_discount_amount: None,
            usage_limit: None,
            expiration_date: now() + Duration::days(30),
            status: VoucherStatus::Active,
            apply_mode: ApplyMode::Individual,
            category: VoucherCategory::User,
            user_id: None,
            restaurant_id: None,
            product_id: None,
            created_at: now(),
            updated_at: now(),
            conditions: Vec::new(),
        }
    }

    fn user(id: i64) -> User {
        User { id, name: "Minh".into(), role: "Customer".into(), created_at: now() - Duration::days(100) }
    }

    fn api(db: MockVoucherBackend) -> VoucherApi<MockVoucherBackend, FixedClock> {
        VoucherApi::new_with_clock(db, FixedClock(now()))
    }

    #[test]
    fn percentage_discounts_are_capped() {
        let api = api(MockVoucherBackend::new());
        let mut v = voucher(VoucherType::Percentage, 50);
        v.maximum_discount_amount = Some(Vnd::from(20_000));
        assert_eq!(api.calculate_discount(&v, Vnd::from(100_000)), Vnd::from(20_000));
        assert_eq!(api.calculate_discount(&v, Vnd::from(30_000)), Vnd::from(15_000));
    }

    #[test]
    fn percentage_discounts_round_half_away_from_zero() {
        let api = api(MockVoucherBackend::new());
        let v = voucher(VoucherType::Percentage, 15);
        // 15% of 10,003 is 1,500.45
        assert_eq!(api.calculate_discount(&v, Vnd::from(10_003)), Vnd::from(1_500));
        // 15% of 10,010 is 1,501.5
        assert_eq!(api.calculate_discount(&v, Vnd::from(10_010)), Vnd::from(1_502));
    }

    #[test]
    fn fixed_discounts_ignore_the_total() {
        let api = api(MockVoucherBackend::new());
        let mut v = voucher(VoucherType::Fixed, 10_000);
        v.maximum_discount_amount = Some(Vnd::from(5_000));
        assert_eq!(api.calculate_discount(&v, Vnd::from(25_000)), Vnd::from(10_000));
        assert_eq!(api.calculate_discount(&v, Vnd::from(900_000)), Vnd::from(10_000));
    }

    #[test]
    fn eligibility_rules() {
        let api = api(MockVoucherBackend::new());
        let u = user(7);
        let mut v = voucher(VoucherType::Fixed, 1000);
        assert!(api.is_eligible(&v, Some(&u), 0));
        v.user_id = Some(7);
        assert!(api.is_eligible(&v, Some(&u), 0));
        v.user_id = Some(8);
        assert!(!api.is_eligible(&v, Some(&u), 0));

        let mut v = voucher(VoucherType::Fixed, 1000);
        v.apply_mode = ApplyMode::Condition;
        assert!(!api.is_eligible(&v, Some(&u), 0));
        v.category = VoucherCategory::FreeShipping;
        assert!(api.is_eligible(&v, Some(&u), 0));
        v.conditions.push(VoucherCondition {
            id: 1,
            voucher_id: 1,
            condition_type: ConditionType::User,
            field: ConditionField::TotalOrders,
            operator: ConditionOperator::Gte,
            value: "5".into(),
        });
        assert!(!api.is_eligible(&v, Some(&u), 4));
        assert!(api.is_eligible(&v, Some(&u), 5));
    }

    #[tokio::test]
    async fn validation_stops_at_the_first_failure() {
        let mut db = MockVoucherBackend::new();
        db.expect_fetch_active_voucher_by_code().with(eq("SAVE10"), eq(now())).returning(|_, _| {
            let mut v = voucher(VoucherType::Percentage, 10);
            v.user_id = Some(99);
            Ok(Some(v))
        });
        db.expect_fetch_user().with(eq(7)).returning(|id| Ok(Some(user(id))));
        db.expect_count_orders_for_user().never();
        let api = api(db);
        let result = api.validate_for_order(" save10 ", 7, Vnd::from(200_000), 1, &[]).await;
        assert!(!result.is_valid);
        assert_eq!(result.message, MSG_NOT_YOUR_VOUCHER);
        assert!(result.discount.is_zero());
    }

    #[tokio::test]
    async fn backend_errors_become_rejections() {
        let mut db = MockVoucherBackend::new();
        db.expect_fetch_active_voucher_by_code()
            .returning(|_, _| Err(VoucherDbError::DatabaseError("disk I/O error".into())));
        let api = api(db);
        let result = api.validate_for_order("SAVE10", 7, Vnd::from(200_000), 1, &[]).await;
        assert!(!result.is_valid);
        assert_eq!(result.message, "Could not validate voucher: Database error: disk I/O error");

        let mut db = MockVoucherBackend::new();
        db.expect_fetch_active_vouchers().returning(|_| Err(VoucherDbError::DatabaseError("locked".into())));
        let listed = VoucherApi::new_with_clock(db, FixedClock(now())).list_eligible_vouchers(7).await;
        assert!(!listed.success);
        assert!(listed.vouchers.is_empty());
    }

    #[tokio::test]
    async fn exhausted_vouchers_are_rejected() {
        let mut db = MockVoucherBackend::new();
        db.expect_fetch_active_voucher_by_code().returning(|_, _| {
            let mut v = voucher(VoucherType::Fixed, 10_000);
            v.usage_limit = Some(0);
            Ok(Some(v))
        });
        db.expect_fetch_user().returning(|id| Ok(Some(user(id))));
        let api = api(db);
        let result = api.validate_for_order("SAVE10", 7, Vnd::from(200_000), 1, &[]).await;
        assert_eq!(result.message, MSG_USAGE_LIMIT);
    }

    #[tokio::test]
    async fn create_rejects_duplicates_and_bad_input() {
        let mut db = MockVoucherBackend::new();
        db.expect_voucher_code_exists().with(eq("TAKEN"), eq(None)).returning(|_, _| Ok(true));
        db.expect_insert_voucher().never();
        let api = api(db);
        let taken = NewVoucher::new("taken", VoucherType::Fixed, Decimal::from(5000), now() + Duration::days(1));
        assert!(matches!(api.create_voucher(taken).await, Err(VoucherAdminError::DuplicateCode(c)) if c == "TAKEN"));
        let too_much = NewVoucher::new("BIG", VoucherType::Percentage, Decimal::from(150), now() + Duration::days(1));
        assert!(matches!(api.create_voucher(too_much).await, Err(VoucherAdminError::InvalidVoucher(_))));
        let bad_code = NewVoucher::new("no spaces", VoucherType::Fixed, Decimal::from(1), now() + Duration::days(1));
        assert!(matches!(api.create_voucher(bad_code).await, Err(VoucherAdminError::InvalidVoucher(_))));
    }

    #[tokio::test]
    async fn generated_codes_skip_collisions() {
        let mut db = MockVoucherBackend::new();
        let mut calls = 0;
        db.expect_voucher_code_exists().times(3).returning(move |_, _| {
            calls += 1;
            Ok(calls < 3)
        });
        let api = api(db);
        let code = api.generate_unique_voucher_code().await.unwrap();
        assert_eq!(code.len(), VOUCHER_CODE_LENGTH);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn redeeming_an_exhausted_voucher_fails() {
        let mut db = MockVoucherBackend::new();
        db.expect_decrement_usage_limit().with(eq(3), eq(now())).returning(|_, _| Ok(UsageOutcome::Exhausted));
        db.expect_decrement_usage_limit().with(eq(4), eq(now())).returning(|_, _| Ok(UsageOutcome::Remaining(2)));
        let api = api(db);
        assert!(matches!(api.redeem_voucher(3).await, Err(VoucherAdminError::UsageLimitReached(3))));
        assert_eq!(api.redeem_voucher(4).await.unwrap(), UsageOutcome::Remaining(2));
    }

    #[tokio::test]
    async fn fetching_by_id_ignores_status_and_expiry() {
        let mut db = MockVoucherBackend::new();
        db.expect_fetch_voucher_by_id().with(eq(5)).returning(|id| {
            let mut v = voucher(VoucherType::Fixed, 10_000);
            v.id = id;
            v.status = VoucherStatus::Inactive;
            v.expiration_date = now() - Duration::days(3);
            Ok(Some(v))
        });
        db.expect_fetch_voucher_by_id().with(eq(6)).returning(|_| Ok(None));
        let api = api(db);
        let found = api.fetch_voucher(5).await.unwrap();
        assert_eq!((found.id, found.status), (5, VoucherStatus::Inactive));
        assert!(matches!(api.fetch_voucher(6).await, Err(VoucherAdminError::VoucherNotFound(6))));
    }

    #[test]
    fn categories_have_display_names() {
        let api = api(MockVoucherBackend::new());
        let names = api.voucher_categories().into_iter().map(|c| c.name).collect::<Vec<_>>();
        assert_eq!(names, vec!["User", "Restaurant", "Product", "Free Shipping"]);
    }
}
