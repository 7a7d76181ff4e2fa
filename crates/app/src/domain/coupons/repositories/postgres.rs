//! Postgres Coupons Repository

use std::error::Error as StdError;

use async_trait::async_trait;
use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use redeem::{
    conditions::{
        ConditionKind, CustomerGroup, Operator, OrderCondition, Predicate, PredicateParts,
        UsageConditions,
    },
    coupons::{CouponCode, CouponType, ValidityWindow},
    discounts::{BuyGroup, BuyXGetY, Discount, DiscountType, GetGroup, Minimum},
    ids::TypedId,
    idset::IdSet,
    items::EntityKind,
    pricing::Percent,
};
use rust_decimal::Decimal;
use sqlx::{
    FromRow, PgPool, Postgres, Row, error::UnexpectedNullError, postgres::PgRow, query, query_as,
    query_scalar,
};

use crate::domain::coupons::{
    StoreError,
    query::CouponQuery,
    records::{
        CouponId, CouponRecord, CustomerConditionId, CustomerConditionRecord, CustomerEmailId,
        CustomerEmailRecord, NewCouponRow, NewCustomerConditionRow, OrderConditionId,
        OrderConditionRecord, TargetProductId, TargetProductRecord,
    },
    repositories::CouponsRepository,
};

const FIND_COUPON_BY_CODE_SQL: &str = include_str!("sql/find_coupon_by_code.sql");
const INSERT_COUPON_SQL: &str = include_str!("sql/insert_coupon.sql");
const GET_COUPON_SQL: &str = include_str!("sql/get_coupon.sql");
const UPDATE_COUPON_STATUS_SQL: &str = include_str!("sql/update_coupon_status.sql");
const UPDATE_COUPON_VALIDITY_SQL: &str = include_str!("sql/update_coupon_validity.sql");
const DELETE_COUPON_SQL: &str = include_str!("sql/delete_coupon.sql");
const SEARCH_COUPONS_SQL: &str = include_str!("sql/search_coupons.sql");
const COUNT_COUPONS_SQL: &str = include_str!("sql/count_coupons.sql");
const LIST_ACTIVE_COUPONS_SQL: &str = include_str!("sql/list_active_coupons.sql");
const INSERT_TARGET_PRODUCTS_SQL: &str = include_str!("sql/insert_target_products.sql");
const LIST_TARGET_PRODUCTS_SQL: &str = include_str!("sql/list_target_products.sql");
const DELETE_TARGET_PRODUCTS_SQL: &str = include_str!("sql/delete_target_products.sql");
const INSERT_CUSTOMER_CONDITION_SQL: &str = include_str!("sql/insert_customer_condition.sql");
const LIST_CUSTOMER_CONDITIONS_SQL: &str = include_str!("sql/list_customer_conditions.sql");
const DELETE_CUSTOMER_CONDITIONS_SQL: &str = include_str!("sql/delete_customer_conditions.sql");
const INSERT_CUSTOMER_EMAILS_SQL: &str = include_str!("sql/insert_customer_emails.sql");
const LIST_CUSTOMER_EMAILS_SQL: &str = include_str!("sql/list_customer_emails.sql");
const DELETE_CUSTOMER_EMAILS_SQL: &str = include_str!("sql/delete_customer_emails.sql");
const INSERT_ORDER_CONDITION_SQL: &str = include_str!("sql/insert_order_condition.sql");
const LIST_ORDER_CONDITIONS_SQL: &str = include_str!("sql/list_order_conditions.sql");
const DELETE_ORDER_CONDITIONS_SQL: &str = include_str!("sql/delete_order_conditions.sql");

#[derive(Debug, Clone)]
pub struct PgCouponsRepository {
    pool: PgPool,
}

impl PgCouponsRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CouponsRepository for PgCouponsRepository {
    async fn find_coupon_by_code(&self, code: &str) -> Result<Option<CouponId>, StoreError> {
        let id: Option<i64> = query_scalar(FIND_COUPON_BY_CODE_SQL)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(id.map(CouponId::new))
    }

    async fn insert_coupon(&self, coupon: &NewCouponRow) -> Result<CouponRecord, StoreError> {
        let discount = DiscountColumns::try_from(&coupon.discount)?;

        let max_total_uses = coupon
            .usage
            .max_total_uses
            .map(|uses| to_i32(uses, "max_total_uses"))
            .transpose()?;

        let record = query_as::<Postgres, CouponRecord>(INSERT_COUPON_SQL)
            .bind(coupon.code.as_str())
            .bind(coupon.coupon_type.as_str())
            .bind(coupon.description.as_deref())
            .bind(coupon.status)
            .bind(discount.discount_type)
            .bind(discount.discount_value)
            .bind(discount.buy_min_quantity)
            .bind(discount.buy_min_amount)
            .bind(discount.buy_entity)
            .bind(discount.buy_ids)
            .bind(discount.get_quantity)
            .bind(discount.get_discount_percent)
            .bind(discount.get_entity)
            .bind(discount.get_ids)
            .bind(SqlxTimestamp::from(coupon.validity.start()))
            .bind(SqlxTimestamp::from(coupon.validity.end()))
            .bind(max_total_uses)
            .bind(coupon.usage.one_use_per_customer)
            .fetch_one(&self.pool)
            .await?;

        Ok(record)
    }

    async fn get_coupon(&self, id: CouponId) -> Result<Option<CouponRecord>, StoreError> {
        let record = query_as::<Postgres, CouponRecord>(GET_COUPON_SQL)
            .bind(id.into_i64())
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn update_coupon_status(&self, id: CouponId, status: bool) -> Result<bool, StoreError> {
        let rows_affected = query(UPDATE_COUPON_STATUS_SQL)
            .bind(id.into_i64())
            .bind(status)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn update_coupon_validity(
        &self,
        id: CouponId,
        validity: ValidityWindow,
    ) -> Result<bool, StoreError> {
        let rows_affected = query(UPDATE_COUPON_VALIDITY_SQL)
            .bind(id.into_i64())
            .bind(SqlxTimestamp::from(validity.start()))
            .bind(SqlxTimestamp::from(validity.end()))
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn delete_coupon(&self, id: CouponId) -> Result<u64, StoreError> {
        let rows_affected = query(DELETE_COUPON_SQL)
            .bind(id.into_i64())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    async fn search_coupons(
        &self,
        query: &CouponQuery,
    ) -> Result<(Vec<CouponRecord>, u64), StoreError> {
        let code = query.code_filter();
        let limit = to_i64(query.effective_limit(), "limit")?;
        let offset = to_i64(query.offset, "offset")?;

        let records = query_as::<Postgres, CouponRecord>(SEARCH_COUPONS_SQL)
            .bind(code)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = query_scalar(COUNT_COUPONS_SQL)
            .bind(code)
            .fetch_one(&self.pool)
            .await?;

        let total = u64::try_from(total).map_err(|e| column_error("count", e))?;

        Ok((records, total))
    }

    async fn list_active_coupons(&self, now: Timestamp) -> Result<Vec<CouponRecord>, StoreError> {
        let records = query_as::<Postgres, CouponRecord>(LIST_ACTIVE_COUPONS_SQL)
            .bind(SqlxTimestamp::from(now))
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn insert_target_products(
        &self,
        coupon: CouponId,
        variant_ids: &[String],
    ) -> Result<Vec<TargetProductId>, StoreError> {
        if variant_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = query_scalar(INSERT_TARGET_PRODUCTS_SQL)
            .bind(coupon.into_i64())
            .bind(variant_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids.into_iter().map(TargetProductId::new).collect())
    }

    async fn list_target_products(
        &self,
        coupons: &[CouponId],
    ) -> Result<Vec<TargetProductRecord>, StoreError> {
        if coupons.is_empty() {
            return Ok(Vec::new());
        }

        let records = query_as::<Postgres, TargetProductRecord>(LIST_TARGET_PRODUCTS_SQL)
            .bind(raw_ids(coupons))
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn delete_target_products(&self, ids: &[TargetProductId]) -> Result<u64, StoreError> {
        self.delete_by_ids(DELETE_TARGET_PRODUCTS_SQL, &raw_ids(ids))
            .await
    }

    async fn insert_customer_condition(
        &self,
        condition: &NewCustomerConditionRow,
    ) -> Result<CustomerConditionId, StoreError> {
        let id: i64 = query_scalar(INSERT_CUSTOMER_CONDITION_SQL)
            .bind(condition.coupon_id.into_i64())
            .bind(condition.customer_group.as_str())
            .bind(condition.min_purchased_amount)
            .fetch_one(&self.pool)
            .await?;

        Ok(CustomerConditionId::new(id))
    }

    async fn list_customer_conditions(
        &self,
        coupons: &[CouponId],
    ) -> Result<Vec<CustomerConditionRecord>, StoreError> {
        if coupons.is_empty() {
            return Ok(Vec::new());
        }

        let records = query_as::<Postgres, CustomerConditionRecord>(LIST_CUSTOMER_CONDITIONS_SQL)
            .bind(raw_ids(coupons))
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn delete_customer_conditions(
        &self,
        ids: &[CustomerConditionId],
    ) -> Result<u64, StoreError> {
        self.delete_by_ids(DELETE_CUSTOMER_CONDITIONS_SQL, &raw_ids(ids))
            .await
    }

    async fn insert_customer_emails(
        &self,
        condition: CustomerConditionId,
        emails: &[String],
    ) -> Result<Vec<CustomerEmailId>, StoreError> {
        if emails.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = query_scalar(INSERT_CUSTOMER_EMAILS_SQL)
            .bind(condition.into_i64())
            .bind(emails)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids.into_iter().map(CustomerEmailId::new).collect())
    }

    async fn list_customer_emails(
        &self,
        conditions: &[CustomerConditionId],
    ) -> Result<Vec<CustomerEmailRecord>, StoreError> {
        if conditions.is_empty() {
            return Ok(Vec::new());
        }

        let records = query_as::<Postgres, CustomerEmailRecord>(LIST_CUSTOMER_EMAILS_SQL)
            .bind(raw_ids(conditions))
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn delete_customer_emails(&self, ids: &[CustomerEmailId]) -> Result<u64, StoreError> {
        self.delete_by_ids(DELETE_CUSTOMER_EMAILS_SQL, &raw_ids(ids))
            .await
    }

    // Rows go in one statement each; a failure part way leaves earlier rows for
    // the coupon delete to cascade over.
    async fn insert_order_conditions(
        &self,
        coupon: CouponId,
        conditions: &[OrderCondition],
    ) -> Result<Vec<OrderConditionId>, StoreError> {
        let mut ids = Vec::with_capacity(conditions.len());

        for condition in conditions {
            let parts = condition.predicate.to_parts();
            let min_quantity = to_i32(condition.min_quantity, "min_quantity")?;

            let id: i64 = query_scalar(INSERT_ORDER_CONDITION_SQL)
                .bind(coupon.into_i64())
                .bind(parts.kind.as_str())
                .bind(parts.operator.as_str())
                .bind(parts.value_decimal)
                .bind(parts.value_ids)
                .bind(min_quantity)
                .fetch_one(&self.pool)
                .await?;

            ids.push(OrderConditionId::new(id));
        }

        Ok(ids)
    }

    async fn list_order_conditions(
        &self,
        coupons: &[CouponId],
    ) -> Result<Vec<OrderConditionRecord>, StoreError> {
        if coupons.is_empty() {
            return Ok(Vec::new());
        }

        let records = query_as::<Postgres, OrderConditionRecord>(LIST_ORDER_CONDITIONS_SQL)
            .bind(raw_ids(coupons))
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn delete_order_conditions(&self, ids: &[OrderConditionId]) -> Result<u64, StoreError> {
        self.delete_by_ids(DELETE_ORDER_CONDITIONS_SQL, &raw_ids(ids))
            .await
    }
}

impl PgCouponsRepository {
    async fn delete_by_ids(&self, sql: &'static str, ids: &[i64]) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let rows_affected = query(sql)
            .bind(ids)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

fn raw_ids<T>(ids: &[TypedId<T>]) -> Vec<i64> {
    ids.iter().map(|id| id.into_i64()).collect()
}

fn column_error(column: &str, error: impl StdError + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(error),
    }
}

fn to_i32(value: u32, column: &str) -> Result<i32, sqlx::Error> {
    i32::try_from(value).map_err(|e| column_error(column, e))
}

fn to_i64(value: u64, column: &str) -> Result<i64, sqlx::Error> {
    i64::try_from(value).map_err(|e| column_error(column, e))
}

fn to_u32(value: i32, column: &str) -> Result<u32, sqlx::Error> {
    u32::try_from(value).map_err(|e| column_error(column, e))
}

fn required<T>(value: Option<T>, column: &str) -> Result<T, sqlx::Error> {
    value.ok_or_else(|| column_error(column, UnexpectedNullError))
}

/// The embedded discount columns of a coupon row.
#[derive(Debug, Default)]
struct DiscountColumns {
    discount_type: &'static str,
    discount_value: Option<Decimal>,
    buy_min_quantity: Option<i32>,
    buy_min_amount: Option<Decimal>,
    buy_entity: Option<&'static str>,
    buy_ids: Option<Vec<String>>,
    get_quantity: Option<i32>,
    get_discount_percent: Option<Decimal>,
    get_entity: Option<&'static str>,
    get_ids: Option<Vec<String>>,
}

impl TryFrom<&Discount> for DiscountColumns {
    type Error = sqlx::Error;

    fn try_from(discount: &Discount) -> Result<Self, Self::Error> {
        let discount_type = discount.discount_type().as_str();

        match discount {
            Discount::Fixed(_) | Discount::Percentage(_) => Ok(Self {
                discount_type,
                discount_value: discount.value(),
                ..Self::default()
            }),
            Discount::BuyXGetY(terms) => {
                let (buy_min_quantity, buy_min_amount) = match terms.buy().requirement {
                    Minimum::Quantity(quantity) => {
                        (Some(to_i32(quantity, "buy_min_quantity")?), None)
                    }
                    Minimum::Amount(amount) => (None, Some(amount)),
                };

                Ok(Self {
                    discount_type,
                    discount_value: None,
                    buy_min_quantity,
                    buy_min_amount,
                    buy_entity: Some(terms.buy().entity.as_str()),
                    buy_ids: Some(terms.buy().ids.to_vec()),
                    get_quantity: Some(to_i32(terms.get().quantity, "get_quantity")?),
                    get_discount_percent: Some(terms.get().discount_percent.value()),
                    get_entity: Some(terms.get().entity.as_str()),
                    get_ids: Some(terms.get().ids.to_vec()),
                })
            }
        }
    }
}

fn decode_discount(row: &PgRow) -> sqlx::Result<Discount> {
    let discount_type = row
        .try_get::<String, _>("discount_type")?
        .parse::<DiscountType>()
        .map_err(|e| column_error("discount_type", e))?;

    match discount_type {
        DiscountType::Fixed => {
            let value: Decimal = required(row.try_get("discount_value")?, "discount_value")?;

            Discount::fixed(value).map_err(|e| column_error("discount_value", e))
        }
        DiscountType::Percentage => {
            let value: Decimal = required(row.try_get("discount_value")?, "discount_value")?;

            Discount::percentage(value).map_err(|e| column_error("discount_value", e))
        }
        DiscountType::BuyXGetY => {
            let requirement = match (
                row.try_get::<Option<i32>, _>("buy_min_quantity")?,
                row.try_get::<Option<Decimal>, _>("buy_min_amount")?,
            ) {
                (Some(quantity), _) => Minimum::Quantity(to_u32(quantity, "buy_min_quantity")?),
                (None, amount) => Minimum::Amount(required(amount, "buy_min_amount")?),
            };

            let buy = BuyGroup {
                requirement,
                entity: decode_entity(row, "buy_entity")?,
                ids: IdSet::new(required::<Vec<String>>(row.try_get("buy_ids")?, "buy_ids")?),
            };

            let percent: Decimal =
                required(row.try_get("get_discount_percent")?, "get_discount_percent")?;

            let get = GetGroup {
                quantity: to_u32(
                    required::<i32>(row.try_get("get_quantity")?, "get_quantity")?,
                    "get_quantity",
                )?,
                discount_percent: Percent::new(percent)
                    .map_err(|e| column_error("get_discount_percent", e))?,
                entity: decode_entity(row, "get_entity")?,
                ids: IdSet::new(required::<Vec<String>>(row.try_get("get_ids")?, "get_ids")?),
            };

            BuyXGetY::new(buy, get)
                .map(Discount::BuyXGetY)
                .map_err(|e| column_error("discount_type", e))
        }
    }
}

fn decode_entity(row: &PgRow, column: &str) -> sqlx::Result<EntityKind> {
    required(row.try_get::<Option<String>, _>(column)?, column)?
        .parse::<EntityKind>()
        .map_err(|e| column_error(column, e))
}

impl<'r> FromRow<'r, PgRow> for CouponRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let validity = ValidityWindow::new(
            row.try_get::<SqlxTimestamp, _>("start_timestamp")?.to_jiff(),
            row.try_get::<SqlxTimestamp, _>("end_timestamp")?.to_jiff(),
        )
        .map_err(|e| column_error("end_timestamp", e))?;

        Ok(Self {
            id: CouponId::new(row.try_get("id")?),
            code: CouponCode::parse(row.try_get::<String, _>("code")?)
                .map_err(|e| column_error("code", e))?,
            coupon_type: row
                .try_get::<String, _>("coupon_type")?
                .parse::<CouponType>()
                .map_err(|e| column_error("coupon_type", e))?,
            description: row.try_get("description")?,
            status: row.try_get("status")?,
            discount: decode_discount(row)?,
            validity,
            usage: UsageConditions {
                max_total_uses: row
                    .try_get::<Option<i32>, _>("max_total_uses")?
                    .map(|uses| to_u32(uses, "max_total_uses"))
                    .transpose()?,
                one_use_per_customer: row.try_get("one_use_per_customer")?,
            },
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for TargetProductRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: TargetProductId::new(row.try_get("id")?),
            coupon_id: CouponId::new(row.try_get("coupon_id")?),
            variant_id: row.try_get("variant_id")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for CustomerConditionRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: CustomerConditionId::new(row.try_get("id")?),
            coupon_id: CouponId::new(row.try_get("coupon_id")?),
            customer_group: row
                .try_get::<Option<String>, _>("customer_group")?
                .filter(|group| !group.is_empty())
                .map(CustomerGroup::new),
            min_purchased_amount: row.try_get("min_purchased_amount")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for CustomerEmailRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: CustomerEmailId::new(row.try_get("id")?),
            customer_condition_id: CustomerConditionId::new(row.try_get("customer_condition_id")?),
            email: row.try_get("email")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for OrderConditionRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let parts = PredicateParts {
            kind: row
                .try_get::<String, _>("condition_type")?
                .parse::<ConditionKind>()
                .map_err(|e| column_error("condition_type", e))?,
            operator: row
                .try_get::<String, _>("operator")?
                .parse::<Operator>()
                .map_err(|e| column_error("operator", e))?,
            value_decimal: row.try_get("value_decimal")?,
            value_ids: row.try_get("value_ids")?,
        };

        let predicate = Predicate::try_from(parts).map_err(|e| column_error("operator", e))?;

        Ok(Self {
            id: OrderConditionId::new(row.try_get("id")?),
            coupon_id: CouponId::new(row.try_get("coupon_id")?),
            condition: OrderCondition {
                predicate,
                min_quantity: to_u32(row.try_get("min_quantity")?, "min_quantity")?,
            },
        })
    }
}
