//! Postgres promotion store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query, query_as, PgPool, Postgres};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::Result,
    promotions::model::{Promotion, PromotionUpdate},
};

use super::PromotionsRepository;

const LIST_PROMOTIONS_SQL: &str = "SELECT * FROM promotions ORDER BY created_at, id";

const GET_PROMOTION_SQL: &str = "SELECT * FROM promotions WHERE id = $1";

const LOCK_PROMOTION_SQL: &str = "SELECT * FROM promotions WHERE id = $1 FOR UPDATE";

const GET_PROMOTION_BY_CODE_SQL: &str = "SELECT * FROM promotions WHERE code = $1";

const CREATE_PROMOTION_SQL: &str = "INSERT INTO promotions (id, code, description, discount_type, discount_value, start_date, end_date, is_active, minimum_purchase_amount, usage_limit, usage_count, applicable_products, created_at, updated_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) RETURNING *";

const UPDATE_PROMOTION_SQL: &str = "UPDATE promotions SET code = $2, description = $3, discount_type = $4, discount_value = $5, start_date = $6, end_date = $7, is_active = $8, minimum_purchase_amount = $9, usage_limit = $10, usage_count = COALESCE($11, usage_count), applicable_products = $12, updated_at = $13 \
     WHERE id = $1 RETURNING *";

const DELETE_PROMOTION_SQL: &str = "DELETE FROM promotions WHERE id = $1";

const REDEEM_PROMOTION_SQL: &str = "UPDATE promotions SET usage_count = usage_count + 1, updated_at = $2 \
     WHERE id = $1 AND is_active AND start_date <= $2 AND end_date >= $2 \
     AND (usage_limit = 0 OR usage_count < usage_limit) RETURNING *";

#[derive(Debug, Clone)]
pub struct PgPromotionsRepository {
    pool: PgPool,
}

impl PgPromotionsRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns an error when a migration fails to apply.
    pub async fn migrate(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl PromotionsRepository for PgPromotionsRepository {
    async fn list(&self) -> Result<Vec<Promotion>> {
        Ok(query_as::<Postgres, Promotion>(LIST_PROMOTIONS_SQL)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Promotion>> {
        Ok(query_as::<Postgres, Promotion>(GET_PROMOTION_SQL)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Promotion>> {
        Ok(query_as::<Postgres, Promotion>(GET_PROMOTION_BY_CODE_SQL)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert(&self, promotion: &Promotion) -> Result<Promotion> {
        Ok(query_as::<Postgres, Promotion>(CREATE_PROMOTION_SQL)
            .bind(promotion.id)
            .bind(&promotion.code)
            .bind(&promotion.description)
            .bind(promotion.discount_type)
            .bind(promotion.discount_value)
            .bind(promotion.start_date)
            .bind(promotion.end_date)
            .bind(promotion.is_active)
            .bind(promotion.minimum_purchase_amount)
            .bind(promotion.usage_limit)
            .bind(promotion.usage_count)
            .bind(&promotion.applicable_products)
            .bind(promotion.created_at)
            .bind(promotion.updated_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update(
        &self,
        id: Uuid,
        update: PromotionUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<Promotion>> {
        let mut tx = self.pool.begin().await?;

        // The row lock makes concurrent redemptions wait for this edit.
        let Some(mut promotion) = query_as::<Postgres, Promotion>(LOCK_PROMOTION_SQL)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let usage_count = update.usage_count;

        promotion.merge(update, now);
        promotion.validate()?;

        let updated = query_as::<Postgres, Promotion>(UPDATE_PROMOTION_SQL)
            .bind(promotion.id)
            .bind(&promotion.code)
            .bind(&promotion.description)
            .bind(promotion.discount_type)
            .bind(promotion.discount_value)
            .bind(promotion.start_date)
            .bind(promotion.end_date)
            .bind(promotion.is_active)
            .bind(promotion.minimum_purchase_amount)
            .bind(promotion.usage_limit)
            .bind(usage_count)
            .bind(&promotion.applicable_products)
            .bind(promotion.updated_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(updated))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = query(DELETE_PROMOTION_SQL)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn redeem(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Promotion>> {
        Ok(query_as::<Postgres, Promotion>(REDEEM_PROMOTION_SQL)
            .bind(id)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?)
    }
}
