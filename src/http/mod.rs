//! HTTP surface

pub mod errors;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::promotions::service::PromotionsService;

#[derive(Clone)]
pub struct AppState {
    pub promotions: Arc<dyn PromotionsService>,
}

impl AppState {
    #[must_use]
    pub fn new(promotions: Arc<dyn PromotionsService>) -> Self {
        Self { promotions }
    }
}

fn promotion_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_promotions).post(handlers::create_promotion),
        )
        .route("/apply", post(handlers::apply_promotion))
        .route(
            "/:id",
            get(handlers::get_promotion)
                .put(handlers::update_promotion)
                .delete(handlers::delete_promotion),
        )
}

/// Promotions are served both at `/promotions` and under `/api/v1`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .nest("/promotions", promotion_routes())
        .nest("/api/v1/promotions", promotion_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
