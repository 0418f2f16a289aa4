//! Home staging fee calculator
//!
//! The monthly fee is the larger of a square-footage estimate and a per-room
//! estimate, adjusted by property type and floored at the minimum monthly fee.
//! Longer terms earn a discount on the monthly fees; setup and removal are
//! charged once.

use super::{check_at_most, check_size, money, PropertyType, MAX_ROOMS, MAX_STAGING_MONTHS};
use crate::error::AppError;
use crate::AppResult;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Monthly rate per square foot
pub const BASE_RATE_PER_SQFT: Decimal = dec!(0.85);

/// Average monthly rate per staged room
pub const AVERAGE_ROOM_RATE: Decimal = dec!(320);

pub const MINIMUM_MONTHLY_FEE: Decimal = dec!(800);
pub const SETUP_FEE: Decimal = dec!(500);
pub const REMOVAL_FEE: Decimal = dec!(300);

/// Staging fee breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagingQuote {
    pub monthly_fee: Decimal,
    pub setup_fee: Decimal,
    pub removal_fee: Decimal,
    pub total_monthly_fees: Decimal,
    pub discount_rate: Decimal,
    pub discount: Decimal,
    pub total_cost: Decimal,
    pub breakdown: Vec<String>,
}

fn property_multiplier(property_type: PropertyType) -> Decimal {
    match property_type {
        PropertyType::House => dec!(1.0),
        PropertyType::Condo => dec!(0.85),
        PropertyType::Townhouse => dec!(0.95),
        PropertyType::Apartment => dec!(0.8),
        PropertyType::Commercial => dec!(1.2),
        PropertyType::Other => dec!(1.0),
    }
}

/// Discount applied to the monthly fees for a staging term
pub fn term_discount(months: u32) -> Decimal {
    match months {
        0 | 1 => Decimal::ZERO,
        2 => dec!(0.05),
        3..=5 => dec!(0.10),
        _ => dec!(0.15),
    }
}

/// Calculate the staging fee for a property
///
/// # Errors
/// Returns `AppError::Validation` when `months` is zero or any input is
/// negative or above its `MAX_*` bound.
pub fn calculate_staging_fee(
    size: Decimal,
    rooms: u32,
    months: u32,
    property_type: PropertyType,
) -> AppResult<StagingQuote> {
    if months == 0 {
        return Err(AppError::Validation(
            "staging term must be at least one month".to_string(),
        ));
    }
    check_at_most("months", months, MAX_STAGING_MONTHS)?;
    check_at_most("rooms", rooms, MAX_ROOMS)?;
    check_size(size)?;

    let by_size = size * BASE_RATE_PER_SQFT;
    let by_rooms = Decimal::from(rooms) * AVERAGE_ROOM_RATE;

    let monthly_fee = (by_size.max(by_rooms) * property_multiplier(property_type))
        .max(MINIMUM_MONTHLY_FEE);
    let monthly_fee = money(monthly_fee);

    let months_dec = Decimal::from(months);
    let discount_rate = term_discount(months);
    let discount = money(monthly_fee * months_dec * discount_rate);
    let total_monthly_fees = monthly_fee * months_dec - discount;
    let total_cost = total_monthly_fees + SETUP_FEE + REMOVAL_FEE;

    let mut breakdown = vec![
        format!(
            "Monthly staging fee: ${:.2} x {} month{}",
            monthly_fee,
            months,
            if months == 1 { "" } else { "s" }
        ),
        format!("Setup fee: ${:.2}", SETUP_FEE),
        format!("Removal fee: ${:.2}", REMOVAL_FEE),
    ];
    if discount > Decimal::ZERO {
        breakdown.push(format!(
            "Term discount ({}%): -${:.2}",
            (discount_rate * dec!(100)).normalize(),
            discount
        ));
    }

    Ok(StagingQuote {
        monthly_fee,
        setup_fee: SETUP_FEE,
        removal_fee: REMOVAL_FEE,
        total_monthly_fees,
        discount_rate,
        discount,
        total_cost,
        breakdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_discount_tiers() {
        assert_eq!(term_discount(1), dec!(0));
        assert_eq!(term_discount(2), dec!(0.05));
        assert_eq!(term_discount(3), dec!(0.10));
        assert_eq!(term_discount(5), dec!(0.10));
        assert_eq!(term_discount(6), dec!(0.15));
        assert_eq!(term_discount(24), dec!(0.15));
    }

    #[test]
    fn test_small_property_hits_minimum() {
        let quote = calculate_staging_fee(dec!(500), 1, 1, PropertyType::Apartment).unwrap();
        assert_eq!(quote.monthly_fee, MINIMUM_MONTHLY_FEE);
        assert_eq!(quote.discount, dec!(0));
        assert_eq!(quote.total_cost, dec!(1600));
    }

    #[test]
    fn test_size_drives_fee_for_large_house() {
        // 2000 sqft * 0.85 = 1700 beats 4 rooms * 320 = 1280
        let quote = calculate_staging_fee(dec!(2000), 4, 3, PropertyType::House).unwrap();
        assert_eq!(quote.monthly_fee, dec!(1700));
        assert_eq!(quote.discount, dec!(510));
        assert_eq!(quote.total_monthly_fees, dec!(4590));
        assert_eq!(quote.total_cost, dec!(5390));
        assert_eq!(quote.breakdown.len(), 4);
    }

    #[test]
    fn test_rooms_drive_fee_with_condo_multiplier() {
        // max(1000 * 0.85, 5 * 320) = 1600, condo 0.85 => 1360
        let quote = calculate_staging_fee(dec!(1000), 5, 6, PropertyType::Condo).unwrap();
        assert_eq!(quote.monthly_fee, dec!(1360));
        assert_eq!(quote.discount_rate, dec!(0.15));
        assert_eq!(quote.discount, dec!(1224));
    }

    #[test]
    fn test_monthly_fee_never_below_minimum() {
        for rooms in 0..4 {
            for size in [0, 100, 600, 900] {
                let quote = calculate_staging_fee(
                    Decimal::from(size),
                    rooms,
                    2,
                    PropertyType::Apartment,
                )
                .unwrap();
                assert!(quote.monthly_fee >= MINIMUM_MONTHLY_FEE);
            }
        }
    }

    #[test]
    fn test_zero_months_rejected() {
        let result = calculate_staging_fee(dec!(1200), 3, 0, PropertyType::House);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_out_of_range_inputs_rejected() {
        let huge = dec!(70000000000000000000000000000);
        for result in [
            calculate_staging_fee(huge, 3, 4, PropertyType::House),
            calculate_staging_fee(dec!(1200), 3, 4_000_000_000, PropertyType::House),
            calculate_staging_fee(dec!(1200), u32::MAX, 4, PropertyType::Commercial),
            calculate_staging_fee(dec!(-1), 3, 4, PropertyType::House),
        ] {
            assert!(matches!(result, Err(AppError::Validation(_))));
        }
    }

    #[test]
    fn test_largest_accepted_inputs_price_fine() {
        let quote = calculate_staging_fee(
            crate::pricing::MAX_PROPERTY_SIZE,
            MAX_ROOMS,
            MAX_STAGING_MONTHS,
            PropertyType::Commercial,
        )
        .unwrap();
        assert!(quote.total_cost > Decimal::ZERO);
    }
}
