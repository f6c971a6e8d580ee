//! In-process promotion store

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{LedgerError, Result},
    promotions::{
        eligibility::has_reached_limit,
        model::{Promotion, PromotionUpdate},
    },
};

use super::PromotionsRepository;

/// Promotions held in a map behind a single lock. Every mutation, including
/// the conditional redemption increment, happens under one write guard.
#[derive(Debug, Default)]
pub struct MemoryPromotionsRepository {
    promotions: RwLock<HashMap<Uuid, Promotion>>,
}

impl MemoryPromotionsRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn code_taken(promotions: &HashMap<Uuid, Promotion>, code: &str, except: Uuid) -> bool {
    promotions
        .values()
        .any(|existing| existing.id != except && existing.code == code)
}

#[async_trait]
impl PromotionsRepository for MemoryPromotionsRepository {
    async fn list(&self) -> Result<Vec<Promotion>> {
        let mut promotions: Vec<Promotion> =
            self.promotions.read().await.values().cloned().collect();

        promotions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(promotions)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Promotion>> {
        Ok(self.promotions.read().await.get(&id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Promotion>> {
        Ok(self
            .promotions
            .read()
            .await
            .values()
            .find(|promotion| promotion.code == code)
            .cloned())
    }

    async fn insert(&self, promotion: &Promotion) -> Result<Promotion> {
        let mut promotions = self.promotions.write().await;

        if promotions.contains_key(&promotion.id)
            || code_taken(&promotions, &promotion.code, promotion.id)
        {
            return Err(LedgerError::DuplicateCode);
        }

        promotions.insert(promotion.id, promotion.clone());

        Ok(promotion.clone())
    }

    async fn update(
        &self,
        id: Uuid,
        update: PromotionUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<Promotion>> {
        let mut promotions = self.promotions.write().await;

        let Some(mut promotion) = promotions.get(&id).cloned() else {
            return Ok(None);
        };

        promotion.merge(update, now);
        promotion.validate()?;

        if code_taken(&promotions, &promotion.code, id) {
            return Err(LedgerError::DuplicateCode);
        }

        promotions.insert(id, promotion.clone());

        Ok(Some(promotion))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.promotions.write().await.remove(&id).is_some())
    }

    async fn redeem(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Promotion>> {
        let mut promotions = self.promotions.write().await;

        let Some(promotion) = promotions.get_mut(&id) else {
            return Ok(None);
        };

        let in_window = promotion.start_date <= now && now <= promotion.end_date;

        if !promotion.is_active || !in_window || has_reached_limit(promotion) {
            return Ok(None);
        }

        promotion.usage_count += 1;
        promotion.updated_at = now;

        Ok(Some(promotion.clone()))
    }
}
