//! Promotion storage

mod memory;
mod postgres;

pub use memory::MemoryPromotionsRepository;
pub use postgres::PgPromotionsRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::Result,
    promotions::model::{Promotion, PromotionUpdate},
};

/// Storage contract for promotion records.
///
/// `redeem` is the only path that moves `usage_count` during checkout. It must
/// be a single conditional update: increment only while the promotion is
/// active, inside its window at `now`, and below its usage limit. `Ok(None)`
/// means no record matched and nothing was written.
#[async_trait]
pub trait PromotionsRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Promotion>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Promotion>>;

    async fn find_by_code(&self, code: &str) -> Result<Option<Promotion>>;

    /// Fails with `DuplicateCode` when another record already owns the code.
    async fn insert(&self, promotion: &Promotion) -> Result<Promotion>;

    /// Merge `update` over the current record and validate the result, all
    /// against the stored row rather than an earlier snapshot, so a concurrent
    /// `redeem` is never overwritten. `usage_count` is only written when the
    /// update sets it. `Ok(None)` when the id is unknown.
    async fn update(
        &self,
        id: Uuid,
        update: PromotionUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<Promotion>>;

    /// Hard delete. `Ok(false)` when the id is unknown.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    async fn redeem(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Promotion>>;
}
