//! Promotions Service

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, Span};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{LedgerError, Result},
    events::{EventPublisher, PromotionEvent},
    promotions::{
        eligibility::{check_redeemable, discount_for},
        model::{ApplyPromotion, NewPromotion, Promotion, PromotionUpdate, Redemption},
        repository::PromotionsRepository,
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PromotionsService: Send + Sync {
    async fn list(&self) -> Result<Vec<Promotion>>;

    async fn get(&self, id: Uuid) -> Result<Promotion>;

    async fn create(&self, promotion: NewPromotion) -> Result<Promotion>;

    async fn update(&self, id: Uuid, update: PromotionUpdate) -> Result<Promotion>;

    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Validate `request.code` against the cart and, when redeemable, record
    /// the redemption before returning the discount.
    async fn apply(&self, request: ApplyPromotion) -> Result<Redemption>;
}

/// The promotion ledger: CRUD over promotion records plus redemption.
#[derive(Clone)]
pub struct Ledger {
    promotions: Arc<dyn PromotionsRepository>,
    events: EventPublisher,
}

impl Ledger {
    #[must_use]
    pub fn new(promotions: Arc<dyn PromotionsRepository>, events: EventPublisher) -> Self {
        Self { promotions, events }
    }
}

#[async_trait]
impl PromotionsService for Ledger {
    #[tracing::instrument(name = "promotions.service.list", skip(self), err)]
    async fn list(&self) -> Result<Vec<Promotion>> {
        self.promotions.list().await
    }

    #[tracing::instrument(name = "promotions.service.get", skip(self), fields(promotion_id = %id), err)]
    async fn get(&self, id: Uuid) -> Result<Promotion> {
        self.promotions
            .find_by_id(id)
            .await?
            .ok_or(LedgerError::NotFound)
    }

    #[tracing::instrument(
        name = "promotions.service.create",
        skip(self, promotion),
        fields(code = %promotion.code, promotion_id = tracing::field::Empty),
        err
    )]
    async fn create(&self, promotion: NewPromotion) -> Result<Promotion> {
        promotion.validate()?;

        let promotion = Promotion::new(promotion, Utc::now());

        if self.promotions.find_by_code(&promotion.code).await?.is_some() {
            return Err(LedgerError::DuplicateCode);
        }

        Span::current().record("promotion_id", tracing::field::display(promotion.id));

        let created = self.promotions.insert(&promotion).await?;

        info!(promotion_id = %created.id, code = %created.code, "created promotion");

        self.events
            .publish(PromotionEvent::Created {
                promotion: created.clone(),
            })
            .await;

        Ok(created)
    }

    #[tracing::instrument(
        name = "promotions.service.update",
        skip(self, update),
        fields(promotion_id = %id),
        err
    )]
    async fn update(&self, id: Uuid, update: PromotionUpdate) -> Result<Promotion> {
        let updated = self
            .promotions
            .update(id, update, Utc::now())
            .await?
            .ok_or(LedgerError::NotFound)?;

        info!(promotion_id = %updated.id, "updated promotion");

        self.events
            .publish(PromotionEvent::Updated {
                promotion: updated.clone(),
            })
            .await;

        Ok(updated)
    }

    #[tracing::instrument(name = "promotions.service.delete", skip(self), fields(promotion_id = %id), err)]
    async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.promotions.delete(id).await? {
            return Err(LedgerError::NotFound);
        }

        info!(promotion_id = %id, "deleted promotion");

        self.events
            .publish(PromotionEvent::Deleted { promotion_id: id })
            .await;

        Ok(())
    }

    #[tracing::instrument(
        name = "promotions.service.apply",
        skip(self, request),
        fields(
            code = %request.code,
            cart_total = %request.cart_total,
            cart_lines = request.products.as_ref().map_or(0, Vec::len),
            promotion_id = tracing::field::Empty
        ),
        err
    )]
    async fn apply(&self, request: ApplyPromotion) -> Result<Redemption> {
        request.validate()?;

        let ApplyPromotion {
            code, cart_total, ..
        } = request;

        let promotion = self
            .promotions
            .find_by_code(code.trim())
            .await?
            .ok_or(LedgerError::NotFound)?;

        Span::current().record("promotion_id", tracing::field::display(promotion.id));

        let now = Utc::now();

        check_redeemable(&promotion, now, cart_total)?;

        let redemption = discount_for(&promotion, cart_total);

        let Some(redeemed) = self.promotions.redeem(promotion.id, now).await? else {
            // Lost the conditional update: classify against a fresh snapshot.
            let current = self
                .promotions
                .find_by_id(promotion.id)
                .await?
                .ok_or(LedgerError::NotFound)?;

            check_redeemable(&current, now, cart_total)?;

            return Err(LedgerError::LimitReached);
        };

        info!(
            promotion_id = %redeemed.id,
            usage_count = redeemed.usage_count,
            discount_amount = %redemption.discount_amount,
            "redeemed promotion"
        );

        self.events
            .publish(PromotionEvent::redeemed(&redeemed, cart_total, &redemption))
            .await;

        Ok(redemption)
    }
}
