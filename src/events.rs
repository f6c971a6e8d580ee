//! Promotion lifecycle events published to NATS

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::promotions::model::{Promotion, Redemption};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromotionEvent {
    Created {
        promotion: Promotion,
    },
    Updated {
        promotion: Promotion,
    },
    #[serde(rename_all = "camelCase")]
    Deleted {
        promotion_id: Uuid,
    },
    #[serde(rename_all = "camelCase")]
    Redeemed {
        promotion_id: Uuid,
        code: String,
        usage_count: i64,
        cart_total: Decimal,
        discount_amount: Decimal,
    },
}

impl PromotionEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::Updated { .. } => "updated",
            Self::Deleted { .. } => "deleted",
            Self::Redeemed { .. } => "redeemed",
        }
    }

    pub fn redeemed(promotion: &Promotion, cart_total: Decimal, redemption: &Redemption) -> Self {
        Self::Redeemed {
            promotion_id: promotion.id,
            code: promotion.code.clone(),
            usage_count: promotion.usage_count,
            cart_total,
            discount_amount: redemption.discount_amount,
        }
    }
}

/// Fire-and-forget publisher. Events are emitted after the store write has
/// succeeded; a failed publish is logged and never reaches the caller.
#[derive(Clone, Debug, Default)]
pub struct EventPublisher {
    client: Option<async_nats::Client>,
    prefix: String,
}

impl EventPublisher {
    pub fn nats(client: async_nats::Client, prefix: impl Into<String>) -> Self {
        Self {
            client: Some(client),
            prefix: prefix.into(),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub fn subject(&self, event: &PromotionEvent) -> String {
        format!("{}.{}", self.prefix, event.kind())
    }

    pub async fn publish(&self, event: PromotionEvent) {
        let Some(client) = &self.client else {
            return;
        };

        let subject = self.subject(&event);

        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(%subject, %error, "failed to encode promotion event");
                return;
            }
        };

        if let Err(error) = client.publish(subject.clone(), payload.into()).await {
            tracing::warn!(%subject, %error, "failed to publish promotion event");
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use crate::promotions::{eligibility::discount_for, model::fixtures::promotion};

    use super::*;

    #[test]
    fn subjects_are_prefixed_by_kind() {
        let publisher = EventPublisher {
            client: None,
            prefix: "promotions".to_string(),
        };

        let event = PromotionEvent::Deleted {
            promotion_id: Uuid::nil(),
        };

        assert_eq!(publisher.subject(&event), "promotions.deleted");
        assert!(!publisher.is_enabled());
    }

    #[test]
    fn redeemed_event_serializes_with_type_tag() -> TestResult {
        let mut promotion = promotion("TEN");
        promotion.usage_count = 3;
        let redemption = discount_for(&promotion, dec!(200));

        let value = serde_json::to_value(PromotionEvent::redeemed(
            &promotion,
            dec!(200),
            &redemption,
        ))?;

        assert_eq!(value["type"], "redeemed");
        assert_eq!(value["code"], "TEN");
        assert_eq!(value["usageCount"], 3);
        assert_eq!(value["discountAmount"], 20.0);

        Ok(())
    }

    #[tokio::test]
    async fn disabled_publisher_is_a_no_op() {
        EventPublisher::disabled()
            .publish(PromotionEvent::Deleted {
                promotion_id: Uuid::nil(),
            })
            .await;
    }
}
