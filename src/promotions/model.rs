//! Promotion records and request payloads

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "discount_type", rename_all = "lowercase")]
pub enum DiscountType {
    /// `discount_value` is a percentage of the cart total, within `[0, 100]`.
    Percentage,
    /// `discount_value` is an absolute currency amount.
    Fixed,
}

/// A stored promotion.
///
/// `usage_limit == 0` means the promotion may be redeemed any number of times.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_promotion"))]
pub struct Promotion {
    pub id: Uuid,
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub minimum_purchase_amount: Decimal,
    pub usage_limit: i64,
    pub usage_count: i64,
    pub applicable_products: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Promotion {
    /// Build a fresh record from a create payload. Usage counters start at zero.
    pub fn new(new: NewPromotion, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            code: new.code.trim().to_string(),
            description: new.description,
            discount_type: new.discount_type,
            discount_value: new.discount_value,
            start_date: new.start_date,
            end_date: new.end_date,
            is_active: new.is_active,
            minimum_purchase_amount: new.minimum_purchase_amount,
            usage_limit: new.usage_limit,
            usage_count: 0,
            applicable_products: new.applicable_products,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge the provided fields over this record. Omitted fields are left unchanged.
    pub fn merge(&mut self, update: PromotionUpdate, now: DateTime<Utc>) {
        let PromotionUpdate {
            code,
            description,
            discount_type,
            discount_value,
            start_date,
            end_date,
            is_active,
            minimum_purchase_amount,
            usage_limit,
            usage_count,
            applicable_products,
        } = update;

        if let Some(code) = code {
            self.code = code.trim().to_string();
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(discount_type) = discount_type {
            self.discount_type = discount_type;
        }
        if let Some(discount_value) = discount_value {
            self.discount_value = discount_value;
        }
        if let Some(start_date) = start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = end_date {
            self.end_date = end_date;
        }
        if let Some(is_active) = is_active {
            self.is_active = is_active;
        }
        if let Some(minimum) = minimum_purchase_amount {
            self.minimum_purchase_amount = minimum;
        }
        if let Some(usage_limit) = usage_limit {
            self.usage_limit = usage_limit;
        }
        if let Some(usage_count) = usage_count {
            self.usage_count = usage_count;
        }
        if let Some(products) = applicable_products {
            self.applicable_products = products;
        }

        self.updated_at = now;
    }
}

/// Create payload. Every field is required except the optional metadata.
#[derive(Clone, Debug, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[validate(schema(function = "validate_new_promotion"))]
pub struct NewPromotion {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub minimum_purchase_amount: Decimal,
    pub usage_limit: i64,
    #[serde(default)]
    pub applicable_products: Vec<String>,
}

/// Partial update payload. Only the fields listed here can be changed;
/// any other key in the request body is rejected.
///
/// `description` distinguishes an omitted key (`None`) from an explicit
/// `null` (`Some(None)`), which clears it.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PromotionUpdate {
    pub code: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<Decimal>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    pub minimum_purchase_amount: Option<Decimal>,
    pub usage_limit: Option<i64>,
    pub usage_count: Option<i64>,
    pub applicable_products: Option<Vec<String>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A cart line submitted alongside a redemption request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Clone, Debug, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplyPromotion {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    #[validate(custom = "non_negative")]
    pub cart_total: Decimal,
    #[serde(default)]
    pub products: Option<Vec<CartLine>>,
}

/// Outcome of a successful redemption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub discount_amount: Decimal,
    pub final_total: Decimal,
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(invalid("non_negative", "must not be negative"));
    }
    Ok(())
}

fn validate_terms(
    discount_type: DiscountType,
    discount_value: Decimal,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    minimum_purchase_amount: Decimal,
    usage_limit: i64,
) -> Result<(), ValidationError> {
    non_negative(&discount_value)?;
    non_negative(&minimum_purchase_amount)?;

    if discount_type == DiscountType::Percentage && discount_value > Decimal::ONE_HUNDRED {
        return Err(invalid(
            "percentage_range",
            "percentage discounts must be between 0 and 100",
        ));
    }
    if start_date > end_date {
        return Err(invalid("window", "startDate must not be after endDate"));
    }
    if usage_limit < 0 {
        return Err(invalid("usage_limit", "usageLimit must not be negative"));
    }

    Ok(())
}

fn validate_new_promotion(new: &NewPromotion) -> Result<(), ValidationError> {
    if new.code.trim().is_empty() {
        return Err(invalid("code", "code must not be blank"));
    }

    validate_terms(
        new.discount_type,
        new.discount_value,
        new.start_date,
        new.end_date,
        new.minimum_purchase_amount,
        new.usage_limit,
    )
}

fn validate_promotion(promotion: &Promotion) -> Result<(), ValidationError> {
    if promotion.code.trim().is_empty() {
        return Err(invalid("code", "code must not be blank"));
    }

    validate_terms(
        promotion.discount_type,
        promotion.discount_value,
        promotion.start_date,
        promotion.end_date,
        promotion.minimum_purchase_amount,
        promotion.usage_limit,
    )?;

    if promotion.usage_count < 0 {
        return Err(invalid("usage_count", "usageCount must not be negative"));
    }
    if promotion.usage_limit > 0 && promotion.usage_count > promotion.usage_limit {
        return Err(invalid(
            "usage_count",
            "usageCount must not exceed usageLimit",
        ));
    }

    Ok(())
}
