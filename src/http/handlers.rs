//! Promotion handlers

use axum::{
    extract::{FromRequest, FromRequestParts, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    http::{errors::ApiError, AppState},
    promotions::model::{ApplyPromotion, NewPromotion, Promotion, PromotionUpdate, Redemption},
};

/// JSON body whose rejections are reported as 400 with the usual error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Path parameters, rejected the same way as [`JsonBody`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);

pub async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": "promotion-ledger"}))
}

pub async fn list_promotions(State(s): State<AppState>) -> Result<Json<Vec<Promotion>>, ApiError> {
    Ok(Json(s.promotions.list().await?))
}

pub async fn get_promotion(
    State(s): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<Promotion>, ApiError> {
    Ok(Json(s.promotions.get(id).await?))
}

pub async fn create_promotion(
    State(s): State<AppState>,
    JsonBody(r): JsonBody<NewPromotion>,
) -> Result<(StatusCode, Json<Promotion>), ApiError> {
    let promotion = s.promotions.create(r).await?;
    Ok((StatusCode::CREATED, Json(promotion)))
}

pub async fn update_promotion(
    State(s): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(r): JsonBody<PromotionUpdate>,
) -> Result<Json<Promotion>, ApiError> {
    Ok(Json(s.promotions.update(id, r).await?))
}

pub async fn delete_promotion(
    State(s): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<Value>, ApiError> {
    s.promotions.delete(id).await?;
    Ok(Json(json!({"message": "Promotion deleted successfully"})))
}

pub async fn apply_promotion(
    State(s): State<AppState>,
    JsonBody(r): JsonBody<ApplyPromotion>,
) -> Result<Json<Redemption>, ApiError> {
    Ok(Json(s.promotions.apply(r).await?))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request},
        response::Response,
    };
    use rust_decimal_macros::dec;
    use testresult::TestResult;
    use tower::ServiceExt;

    use crate::{
        error::LedgerError,
        http::router,
        promotions::{model::fixtures::promotion, service::MockPromotionsService},
    };

    use super::*;

    async fn send(
        mock: MockPromotionsService,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> TestResult<(StatusCode, Value)> {
        let app = router(AppState::new(Arc::new(mock)));

        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))?;

        let response: Response = app.oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };

        Ok((status, value))
    }

    fn create_body(code: &str) -> Value {
        json!({
            "code": code,
            "discountType": "percentage",
            "discountValue": 10,
            "startDate": "2026-01-01T00:00:00Z",
            "endDate": "2026-12-31T23:59:59Z",
            "isActive": true,
            "minimumPurchaseAmount": 0,
            "usageLimit": 0
        })
    }

    #[tokio::test]
    async fn health_reports_service_name() -> TestResult {
        let (status, body) = send(
            MockPromotionsService::new(),
            Method::GET,
            "/health",
            None,
        )
        .await?;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "promotion-ledger");

        Ok(())
    }

    #[tokio::test]
    async fn list_returns_promotions() -> TestResult {
        let stored = promotion("LISTED");
        let returned = stored.clone();

        let mut mock = MockPromotionsService::new();
        mock.expect_list()
            .once()
            .return_once(move || Ok(vec![returned]));

        let (status, body) = send(mock, Method::GET, "/promotions", None).await?;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["code"], "LISTED");
        assert_eq!(body[0]["id"], stored.id.to_string());

        Ok(())
    }

    #[tokio::test]
    async fn get_missing_promotion_is_404() -> TestResult {
        let mut mock = MockPromotionsService::new();
        mock.expect_get()
            .once()
            .return_once(|_| Err(LedgerError::NotFound));

        let (status, body) = send(
            mock,
            Method::GET,
            &format!("/promotions/{}", Uuid::now_v7()),
            None,
        )
        .await?;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "invalid or inactive promotion code");

        Ok(())
    }

    #[tokio::test]
    async fn malformed_id_is_400_with_json_error() -> TestResult {
        let mut mock = MockPromotionsService::new();
        mock.expect_get().never();
        mock.expect_delete().never();

        let (status, body) = send(mock, Method::GET, "/promotions/not-a-uuid", None).await?;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = send(
            MockPromotionsService::new(),
            Method::DELETE,
            "/api/v1/promotions/not-a-uuid",
            None,
        )
        .await?;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        Ok(())
    }

    #[tokio::test]
    async fn create_returns_201() -> TestResult {
        let mut mock = MockPromotionsService::new();
        mock.expect_create()
            .once()
            .withf(|new| new.code == "SPRING" && new.discount_value == dec!(10))
            .return_once(|_| Ok(promotion("SPRING")));

        let (status, body) = send(
            mock,
            Method::POST,
            "/api/v1/promotions",
            Some(create_body("SPRING")),
        )
        .await?;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["code"], "SPRING");
        assert_eq!(body["usageCount"], 0);

        Ok(())
    }

    #[tokio::test]
    async fn create_duplicate_code_is_400() -> TestResult {
        let mut mock = MockPromotionsService::new();
        mock.expect_create()
            .once()
            .return_once(|_| Err(LedgerError::DuplicateCode));

        let (status, _) = send(
            mock,
            Method::POST,
            "/promotions",
            Some(create_body("SPRING")),
        )
        .await?;

        assert_eq!(status, StatusCode::BAD_REQUEST);

        Ok(())
    }

    #[tokio::test]
    async fn create_with_missing_fields_is_400() -> TestResult {
        let mut mock = MockPromotionsService::new();
        mock.expect_create().never();

        let (status, body) = send(
            mock,
            Method::POST,
            "/promotions",
            Some(json!({ "code": "HALF" })),
        )
        .await?;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        Ok(())
    }

    #[tokio::test]
    async fn update_with_unknown_field_is_400() -> TestResult {
        let mut mock = MockPromotionsService::new();
        mock.expect_update().never();

        let (status, _) = send(
            mock,
            Method::PUT,
            &format!("/promotions/{}", Uuid::now_v7()),
            Some(json!({ "isActive": false, "usageCountOverride": 3 })),
        )
        .await?;

        assert_eq!(status, StatusCode::BAD_REQUEST);

        Ok(())
    }

    #[tokio::test]
    async fn update_passes_partial_fields() -> TestResult {
        let id = Uuid::now_v7();

        let mut mock = MockPromotionsService::new();
        mock.expect_update()
            .once()
            .withf(move |got, update| {
                *got == id
                    && *update
                        == PromotionUpdate {
                            is_active: Some(false),
                            ..PromotionUpdate::default()
                        }
            })
            .return_once(|_, _| {
                let mut updated = promotion("PAUSE");
                updated.is_active = false;
                Ok(updated)
            });

        let (status, body) = send(
            mock,
            Method::PUT,
            &format!("/promotions/{id}"),
            Some(json!({ "isActive": false })),
        )
        .await?;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isActive"], false);

        Ok(())
    }

    #[tokio::test]
    async fn delete_returns_message() -> TestResult {
        let mut mock = MockPromotionsService::new();
        mock.expect_delete().once().return_once(|_| Ok(()));

        let (status, body) = send(
            mock,
            Method::DELETE,
            &format!("/promotions/{}", Uuid::now_v7()),
            None,
        )
        .await?;

        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].is_string());

        Ok(())
    }

    #[tokio::test]
    async fn apply_returns_discount() -> TestResult {
        let mut mock = MockPromotionsService::new();
        mock.expect_apply()
            .once()
            .withf(|request| request.code == "TEN" && request.cart_total == dec!(200))
            .return_once(|_| {
                Ok(Redemption {
                    discount_amount: dec!(20),
                    final_total: dec!(180),
                })
            });

        let (status, body) = send(
            mock,
            Method::POST,
            "/promotions/apply",
            Some(json!({ "code": "TEN", "cartTotal": 200, "products": [] })),
        )
        .await?;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["discountAmount"], 20.0);
        assert_eq!(body["finalTotal"], 180.0);

        Ok(())
    }

    #[tokio::test]
    async fn apply_limit_reached_is_400() -> TestResult {
        let mut mock = MockPromotionsService::new();
        mock.expect_apply()
            .once()
            .return_once(|_| Err(LedgerError::LimitReached));

        let (status, body) = send(
            mock,
            Method::POST,
            "/promotions/apply",
            Some(json!({ "code": "ONCE", "cartTotal": 10 })),
        )
        .await?;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "promotion usage limit reached");

        Ok(())
    }

    #[tokio::test]
    async fn apply_below_minimum_names_the_minimum() -> TestResult {
        let mut mock = MockPromotionsService::new();
        mock.expect_apply()
            .once()
            .return_once(|_| Err(LedgerError::BelowMinimum { minimum: dec!(50) }));

        let (status, body) = send(
            mock,
            Method::POST,
            "/promotions/apply",
            Some(json!({ "code": "MIN", "cartTotal": 10 })),
        )
        .await?;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "minimum purchase amount of 50 required");

        Ok(())
    }

    #[tokio::test]
    async fn apply_expired_code_is_404() -> TestResult {
        let mut mock = MockPromotionsService::new();
        mock.expect_apply()
            .once()
            .return_once(|_| Err(LedgerError::NotYetActiveOrExpired));

        let (status, _) = send(
            mock,
            Method::POST,
            "/promotions/apply",
            Some(json!({ "code": "OLD", "cartTotal": 10 })),
        )
        .await?;

        assert_eq!(status, StatusCode::NOT_FOUND);

        Ok(())
    }
}
