//! Coupons Service

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use redeem::coupons::{Coupon, CouponType, ValidityWindow};
use tracing::{Span, info, warn};

use crate::domain::coupons::{
    CouponsServiceError, StoreError,
    data::{NewCoupon, ValidatedCoupon},
    query::{CouponQuery, Loaded, Page},
    records::{CouponId, CouponRecord, CouponRows, CouponSummary},
    repositories::CouponsRepository,
    saga::Cleanup,
};

#[derive(Clone)]
pub struct CouponsManager {
    repository: Arc<dyn CouponsRepository>,
}

impl CouponsManager {
    #[must_use]
    pub fn new(repository: Arc<dyn CouponsRepository>) -> Self {
        Self { repository }
    }

    /// Write the child rows of a freshly inserted coupon, registering each
    /// batch with `cleanup` as soon as it exists.
    async fn insert_conditions(
        &self,
        coupon_id: CouponId,
        coupon: &ValidatedCoupon,
        cleanup: &mut Cleanup,
    ) -> Result<(), StoreError> {
        if !coupon.targets.is_empty() {
            let ids = self
                .repository
                .insert_target_products(coupon_id, &coupon.targets)
                .await?;

            cleanup.targets(ids);
        }

        if let Some(customer) = &coupon.customer {
            let condition_id = self
                .repository
                .insert_customer_condition(&customer.row(coupon_id))
                .await?;

            cleanup.customer_condition(condition_id);

            if !customer.emails.is_empty() {
                let ids = self
                    .repository
                    .insert_customer_emails(condition_id, &customer.emails)
                    .await?;

                cleanup.emails(ids);
            }
        }

        if !coupon.order_conditions.is_empty() {
            let ids = self
                .repository
                .insert_order_conditions(coupon_id, &coupon.order_conditions)
                .await?;

            cleanup.order_conditions(ids);
        }

        Ok(())
    }

    /// Load every condition row for `coupons` and assemble the aggregates.
    async fn assemble(&self, coupons: Vec<CouponRecord>) -> Result<Vec<Coupon>, StoreError> {
        if coupons.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<CouponId> = coupons.iter().map(|coupon| coupon.id).collect();

        let targets = self.repository.list_target_products(&ids).await?;
        let customer_conditions = self.repository.list_customer_conditions(&ids).await?;

        let condition_ids: Vec<_> = customer_conditions
            .iter()
            .map(|condition| condition.id)
            .collect();

        let emails = self.repository.list_customer_emails(&condition_ids).await?;
        let order_conditions = self.repository.list_order_conditions(&ids).await?;

        let rows = CouponRows {
            targets,
            customer_conditions,
            emails,
            order_conditions,
        };

        Ok(rows.assemble(coupons))
    }

    async fn load_coupon(&self, id: CouponId) -> Result<Option<Coupon>, StoreError> {
        let Some(record) = self.repository.get_coupon(id).await? else {
            return Ok(None);
        };

        Ok(self.assemble(vec![record]).await?.into_iter().next())
    }
}

#[async_trait]
impl CouponsService for CouponsManager {
    #[tracing::instrument(
        name = "coupons.service.create_coupon",
        skip(self, coupon, coupon_type),
        fields(
            coupon_type = %coupon_type,
            code = tracing::field::Empty,
            coupon_id = tracing::field::Empty,
            target_count = tracing::field::Empty,
            order_condition_count = tracing::field::Empty
        ),
        err
    )]
    async fn create_coupon(
        &self,
        coupon: NewCoupon,
        coupon_type: CouponType,
    ) -> Result<CouponId, CouponsServiceError> {
        let coupon = coupon.validate(coupon_type)?;

        let span = Span::current();

        span.record("code", tracing::field::display(&coupon.coupon.code));
        span.record("target_count", coupon.targets.len());
        span.record("order_condition_count", coupon.order_conditions.len());

        if coupon.ignored_customer_fields {
            warn!("customer conditions without a customer group are not persisted");
        }

        if self
            .repository
            .find_coupon_by_code(coupon.coupon.code.as_str())
            .await?
            .is_some()
        {
            return Err(CouponsServiceError::DuplicateCode);
        }

        let record = self.repository.insert_coupon(&coupon.coupon).await?;

        span.record("coupon_id", tracing::field::display(record.id));

        let mut cleanup = Cleanup::default();

        cleanup.coupon(record.id);

        if let Err(error) = self.insert_conditions(record.id, &coupon, &mut cleanup).await {
            warn!(coupon_id = %record.id, error = %error, "coupon creation failed, compensating");

            cleanup.compensate(self.repository.as_ref()).await;

            return Err(error.into());
        }

        info!(coupon_id = %record.id, code = %record.code, "created coupon");

        Ok(record.id)
    }

    #[tracing::instrument(
        name = "coupons.service.delete_coupon",
        skip(self),
        fields(coupon_id = %id, email_count = tracing::field::Empty),
        err
    )]
    async fn delete_coupon(&self, id: CouponId) -> Result<(), CouponsServiceError> {
        let customer_conditions = self.repository.list_customer_conditions(&[id]).await?;

        let condition_ids: Vec<_> = customer_conditions
            .iter()
            .map(|condition| condition.id)
            .collect();

        let emails = self.repository.list_customer_emails(&condition_ids).await?;
        let targets = self.repository.list_target_products(&[id]).await?;
        let order_conditions = self.repository.list_order_conditions(&[id]).await?;

        Span::current().record("email_count", emails.len());

        let mut cleanup = Cleanup::default();

        cleanup.coupon(id);

        cleanup.customer_conditions(condition_ids);

        cleanup.emails(emails.iter().map(|email| email.id));
        cleanup.targets(targets.iter().map(|target| target.id));
        cleanup.order_conditions(order_conditions.iter().map(|condition| condition.id));

        cleanup.delete(self.repository.as_ref()).await?;

        info!(coupon_id = %id, "deleted coupon");

        Ok(())
    }

    #[tracing::instrument(
        name = "coupons.service.set_status",
        skip(self),
        fields(coupon_id = %id),
        err
    )]
    async fn set_status(&self, id: CouponId, status: bool) -> Result<(), CouponsServiceError> {
        if !self.repository.update_coupon_status(id, status).await? {
            return Err(CouponsServiceError::NotFound);
        }

        info!(coupon_id = %id, status, "updated coupon status");

        Ok(())
    }

    #[tracing::instrument(
        name = "coupons.service.update_validity",
        skip(self, validity),
        fields(coupon_id = %id, start = %validity.start(), end = %validity.end()),
        err
    )]
    async fn update_validity(
        &self,
        id: CouponId,
        validity: ValidityWindow,
    ) -> Result<(), CouponsServiceError> {
        if !self.repository.update_coupon_validity(id, validity).await? {
            return Err(CouponsServiceError::NotFound);
        }

        info!(coupon_id = %id, "updated coupon validity");

        Ok(())
    }

    #[tracing::instrument(
        name = "coupons.service.search_coupons",
        skip(self, query),
        fields(offset = query.offset, limit = query.effective_limit(), total = tracing::field::Empty)
    )]
    async fn search_coupons(
        &self,
        query: CouponQuery,
    ) -> Loaded<Page<CouponSummary>, CouponsServiceError> {
        match self.repository.search_coupons(&query).await {
            Ok((items, total)) => {
                Span::current().record("total", total);

                Loaded::ok(Page {
                    items,
                    total,
                    offset: query.offset,
                    limit: query.effective_limit(),
                })
            }
            Err(error) => {
                warn!(error = %error, "coupon search failed");

                Loaded::failed(error.into())
            }
        }
    }

    #[tracing::instrument(name = "coupons.service.get_coupon", skip(self), fields(coupon_id = %id))]
    async fn get_coupon(&self, id: CouponId) -> Loaded<Option<Coupon>, CouponsServiceError> {
        self.load_coupon(id)
            .await
            .inspect_err(|error| warn!(error = %error, "coupon load failed"))
            .map_err(CouponsServiceError::from)
            .into()
    }

    #[tracing::instrument(
        name = "coupons.service.active_coupons",
        skip(self),
        fields(count = tracing::field::Empty),
        err
    )]
    async fn active_coupons(&self, now: Timestamp) -> Result<Vec<Coupon>, CouponsServiceError> {
        let records = self.repository.list_active_coupons(now).await?;
        let coupons = self.assemble(records).await?;

        Span::current().record("count", coupons.len());

        Ok(coupons)
    }
}

#[automock]
#[async_trait]
pub trait CouponsService: Send + Sync {
    /// Validate and persist a coupon with its conditions.
    async fn create_coupon(
        &self,
        coupon: NewCoupon,
        coupon_type: CouponType,
    ) -> Result<CouponId, CouponsServiceError>;

    async fn delete_coupon(&self, id: CouponId) -> Result<(), CouponsServiceError>;

    async fn set_status(&self, id: CouponId, status: bool) -> Result<(), CouponsServiceError>;

    async fn update_validity(
        &self,
        id: CouponId,
        validity: ValidityWindow,
    ) -> Result<(), CouponsServiceError>;

    async fn search_coupons(
        &self,
        query: CouponQuery,
    ) -> Loaded<Page<CouponSummary>, CouponsServiceError>;

    /// The full aggregate, or `None` when no coupon has the id.
    async fn get_coupon(&self, id: CouponId) -> Loaded<Option<Coupon>, CouponsServiceError>;

    /// Enabled coupons open at `now`, with their conditions.
    async fn active_coupons(&self, now: Timestamp) -> Result<Vec<Coupon>, CouponsServiceError>;
}
