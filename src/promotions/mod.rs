//! Promotions

pub mod eligibility;
pub mod model;
pub mod repository;
pub mod service;

pub use model::{
    ApplyPromotion, CartLine, DiscountType, NewPromotion, Promotion, PromotionUpdate, Redemption,
};
pub use repository::{MemoryPromotionsRepository, PgPromotionsRepository, PromotionsRepository};
pub use service::{Ledger, PromotionsService};
