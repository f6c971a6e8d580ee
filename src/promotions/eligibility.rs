//! Redemption eligibility and discount arithmetic
//!
//! Both functions are pure over a promotion snapshot so they can be evaluated
//! against a freshly read record, or re-evaluated after a conditional update
//! lost a race.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::{
    error::LedgerError,
    promotions::model::{DiscountType, Promotion, Redemption},
};

/// Check, in order, the active flag, the eligibility window, the usage limit
/// and the minimum purchase amount.
pub fn check_redeemable(
    promotion: &Promotion,
    now: DateTime<Utc>,
    cart_total: Decimal,
) -> Result<(), LedgerError> {
    if !promotion.is_active {
        return Err(LedgerError::NotFound);
    }

    if now < promotion.start_date || now > promotion.end_date {
        return Err(LedgerError::NotYetActiveOrExpired);
    }

    if has_reached_limit(promotion) {
        return Err(LedgerError::LimitReached);
    }

    if cart_total < promotion.minimum_purchase_amount {
        return Err(LedgerError::BelowMinimum {
            minimum: promotion.minimum_purchase_amount,
        });
    }

    Ok(())
}

pub fn has_reached_limit(promotion: &Promotion) -> bool {
    promotion.usage_limit > 0 && promotion.usage_count >= promotion.usage_limit
}

/// Discount for `cart_total`. Percentage discounts are exact, with no
/// rounding to cents. Fixed discounts never exceed the cart total.
pub fn discount_for(promotion: &Promotion, cart_total: Decimal) -> Redemption {
    let discount_amount = match promotion.discount_type {
        DiscountType::Percentage => cart_total * promotion.discount_value / Decimal::ONE_HUNDRED,
        DiscountType::Fixed => promotion.discount_value.min(cart_total),
    };

    Redemption {
        discount_amount,
        final_total: cart_total - discount_amount,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rust_decimal_macros::dec;

    use crate::promotions::model::fixtures::{now, promotion};

    use super::*;

    #[test]
    fn percentage_discount() {
        let promotion = promotion("TEN");

        let redemption = discount_for(&promotion, dec!(200));

        assert_eq!(redemption.discount_amount, dec!(20));
        assert_eq!(redemption.final_total, dec!(180));
    }

    #[test]
    fn fixed_discount() {
        let mut promotion = promotion("FIFTEEN");
        promotion.discount_type = DiscountType::Fixed;
        promotion.discount_value = dec!(15);

        let redemption = discount_for(&promotion, dec!(50));

        assert_eq!(redemption.discount_amount, dec!(15));
        assert_eq!(redemption.final_total, dec!(35));
    }

    #[test]
    fn fixed_discount_is_clamped_to_cart_total() {
        let mut promotion = promotion("BIG");
        promotion.discount_type = DiscountType::Fixed;
        promotion.discount_value = dec!(80);

        let redemption = discount_for(&promotion, dec!(30));

        assert_eq!(redemption.discount_amount, dec!(30));
        assert_eq!(redemption.final_total, Decimal::ZERO);
    }

    #[test]
    fn percentage_discount_is_not_rounded() {
        let mut promotion = promotion("ODD");
        promotion.discount_value = dec!(15);

        let redemption = discount_for(&promotion, dec!(33.33));

        assert_eq!(redemption.discount_amount, dec!(4.9995));
        assert_eq!(redemption.final_total, dec!(28.3305));
    }

    #[test]
    fn inactive_promotion_is_not_found() {
        let mut promotion = promotion("OFF");
        promotion.is_active = false;

        assert!(matches!(
            check_redeemable(&promotion, now(), dec!(100)),
            Err(LedgerError::NotFound)
        ));
    }

    #[test]
    fn window_boundaries_are_inclusive() {
        let promotion = promotion("EDGES");

        assert!(check_redeemable(&promotion, promotion.start_date, dec!(1)).is_ok());
        assert!(check_redeemable(&promotion, promotion.end_date, dec!(1)).is_ok());
    }

    #[test]
    fn outside_window_is_rejected() {
        let promotion = promotion("WINDOW");

        for at in [
            promotion.start_date - Duration::seconds(1),
            promotion.end_date + Duration::seconds(1),
        ] {
            assert!(matches!(
                check_redeemable(&promotion, at, dec!(100)),
                Err(LedgerError::NotYetActiveOrExpired)
            ));
        }
    }

    #[test]
    fn exhausted_promotion_is_rejected() {
        let mut promotion = promotion("USED");
        promotion.usage_limit = 3;
        promotion.usage_count = 3;

        assert!(matches!(
            check_redeemable(&promotion, now(), dec!(100)),
            Err(LedgerError::LimitReached)
        ));
    }

    #[test]
    fn zero_limit_is_unlimited() {
        let mut promotion = promotion("FOREVER");
        promotion.usage_count = 1_000_000;

        assert!(check_redeemable(&promotion, now(), dec!(100)).is_ok());
    }

    #[test]
    fn below_minimum_carries_the_minimum() {
        let mut promotion = promotion("MIN50");
        promotion.minimum_purchase_amount = dec!(50);

        match check_redeemable(&promotion, now(), dec!(49.99)) {
            Err(LedgerError::BelowMinimum { minimum }) => assert_eq!(minimum, dec!(50)),
            other => panic!("expected BelowMinimum, got {other:?}"),
        }
    }

    #[test]
    fn limit_is_checked_before_minimum() {
        let mut promotion = promotion("ORDER");
        promotion.usage_limit = 1;
        promotion.usage_count = 1;
        promotion.minimum_purchase_amount = dec!(50);

        assert!(matches!(
            check_redeemable(&promotion, now(), dec!(10)),
            Err(LedgerError::LimitReached)
        ));
    }
}
