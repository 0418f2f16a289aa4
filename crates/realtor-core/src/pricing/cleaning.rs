//! Cleaning price calculator

use super::{money, PropertyType};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const BEDROOM_RATE: Decimal = dec!(25);
pub const LIVING_ROOM_RATE: Decimal = dec!(30);
pub const OTHER_ROOM_RATE: Decimal = dec!(25);
pub const BATHROOM_RATE: Decimal = dec!(35);
pub const KITCHEN_RATE: Decimal = dec!(45);
pub const SUPPLY_FEE: Decimal = dec!(25);
pub const MINIMUM_FEE: Decimal = dec!(80);

/// Kind of cleaning job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CleaningType {
    #[default]
    #[serde(rename = "regular_cleaning")]
    Regular,
    #[serde(rename = "deep_cleaning")]
    Deep,
    #[serde(rename = "move_in_out")]
    MoveInOut,
    #[serde(rename = "post_construction")]
    PostConstruction,
    #[serde(rename = "pre_listing")]
    PreListing,
}

impl CleaningType {
    pub fn multiplier(&self) -> Decimal {
        match self {
            CleaningType::Regular => dec!(1.0),
            CleaningType::Deep => dec!(1.5),
            CleaningType::MoveInOut => dec!(1.8),
            CleaningType::PostConstruction => dec!(2.2),
            CleaningType::PreListing => dec!(1.3),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CleaningType::Regular => "Regular Cleaning",
            CleaningType::Deep => "Deep Cleaning",
            CleaningType::MoveInOut => "Move In/Out Cleaning",
            CleaningType::PostConstruction => "Post Construction Cleaning",
            CleaningType::PreListing => "Pre-Listing Cleaning",
        }
    }
}

impl fmt::Display for CleaningType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// How often the cleaning recurs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CleaningFrequency {
    #[default]
    OneTime,
    Weekly,
    BiWeekly,
    Monthly,
}

impl CleaningFrequency {
    pub fn discount(&self) -> Decimal {
        match self {
            CleaningFrequency::OneTime => Decimal::ZERO,
            CleaningFrequency::Weekly => dec!(0.15),
            CleaningFrequency::BiWeekly => dec!(0.10),
            CleaningFrequency::Monthly => dec!(0.05),
        }
    }
}

fn property_multiplier(property_type: PropertyType) -> Decimal {
    match property_type {
        PropertyType::Apartment => dec!(0.8),
        PropertyType::Condo => dec!(0.9),
        PropertyType::House => dec!(1.0),
        PropertyType::Townhouse => dec!(1.1),
        PropertyType::Commercial => dec!(1.5),
        PropertyType::Other => dec!(1.0),
    }
}

/// Cleaning price breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningQuote {
    pub base_price: Decimal,
    pub type_multiplier: Decimal,
    pub property_multiplier: Decimal,
    pub frequency_discount: Decimal,
    pub supply_fee: Decimal,
    pub total_price: Decimal,
    pub breakdown: Vec<String>,
}

/// Calculate the price of a cleaning job
///
/// Rooms are split into roughly 40% bedrooms and 30% living areas (at least
/// one of each); the rest are billed at the generic room rate. One kitchen is
/// always included. Counts are widened to `u64` so any `u32` input prices
/// without overflow.
pub fn calculate_cleaning_price(
    rooms: u32,
    bathrooms: u32,
    cleaning_type: CleaningType,
    property_type: PropertyType,
    frequency: CleaningFrequency,
    size: Decimal,
) -> CleaningQuote {
    let mut base_price = Decimal::ZERO;

    if rooms > 0 {
        let rooms = u64::from(rooms);
        let bedrooms = (rooms * 4 / 10).max(1);
        let living_areas = (rooms * 3 / 10).max(1);
        let other_rooms = rooms.saturating_sub(bedrooms + living_areas);

        base_price += Decimal::from(bedrooms) * BEDROOM_RATE;
        base_price += Decimal::from(living_areas) * LIVING_ROOM_RATE;
        base_price += Decimal::from(other_rooms) * OTHER_ROOM_RATE;
    }

    base_price += Decimal::from(bathrooms) * BATHROOM_RATE;
    base_price += KITCHEN_RATE;

    if size > dec!(3000) {
        base_price *= dec!(1.2);
    } else if size > dec!(2000) {
        base_price *= dec!(1.1);
    }
    let base_price = money(base_price);

    let type_multiplier = cleaning_type.multiplier();
    let type_adjusted = base_price * type_multiplier;

    let property_multiplier = property_multiplier(property_type);
    let property_adjusted = money(type_adjusted * property_multiplier);

    let discount_rate = frequency.discount();
    let discount_amount = money(property_adjusted * discount_rate);

    let total_price = (property_adjusted - discount_amount + SUPPLY_FEE).max(MINIMUM_FEE);

    let mut breakdown = vec![
        format!("Base cleaning: ${:.2}", base_price),
        format!(
            "{} ({}%): ${:.2}",
            cleaning_type.label(),
            (type_multiplier * dec!(100)).normalize(),
            money(type_adjusted)
        ),
        format!("Property type adjustment: ${:.2}", property_adjusted),
    ];
    if discount_amount > Decimal::ZERO {
        breakdown.push(format!(
            "Frequency discount ({}%): -${:.2}",
            (discount_rate * dec!(100)).normalize(),
            discount_amount
        ));
    }
    breakdown.push(format!("Cleaning supplies: ${:.2}", SUPPLY_FEE));

    CleaningQuote {
        base_price,
        type_multiplier,
        property_multiplier,
        frequency_discount: discount_amount,
        supply_fee: SUPPLY_FEE,
        total_price,
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_house_one_time() {
        // 5 rooms: 2 bedrooms (50) + 1 living (30) + 2 other (50) = 130
        // + 2 bathrooms (70) + kitchen (45) = 245
        let quote = calculate_cleaning_price(
            5,
            2,
            CleaningType::Regular,
            PropertyType::House,
            CleaningFrequency::OneTime,
            dec!(1500),
        );
        assert_eq!(quote.base_price, dec!(245));
        assert_eq!(quote.frequency_discount, dec!(0));
        assert_eq!(quote.total_price, dec!(270));
    }

    #[test]
    fn test_single_room_remainder_not_negative() {
        // 1 room: 1 bedroom + 1 living, remainder clamps to zero
        let quote = calculate_cleaning_price(
            1,
            0,
            CleaningType::Regular,
            PropertyType::House,
            CleaningFrequency::OneTime,
            Decimal::ZERO,
        );
        assert_eq!(quote.base_price, dec!(100));
    }

    #[test]
    fn test_large_deep_clean_with_weekly_discount() {
        // 10 rooms: 4 bedrooms (100) + 3 living (90) + 3 other (75) = 265
        // + 3 bathrooms (105) + kitchen (45) = 415, > 3000 sqft => 498
        let quote = calculate_cleaning_price(
            10,
            3,
            CleaningType::Deep,
            PropertyType::Townhouse,
            CleaningFrequency::Weekly,
            dec!(3200),
        );
        assert_eq!(quote.base_price, dec!(498));
        // 498 * 1.5 * 1.1 = 821.70, weekly 15% = 123.26 (rounded)
        assert_eq!(quote.frequency_discount, dec!(123.26));
        assert_eq!(quote.total_price, dec!(723.44));
    }

    #[test]
    fn test_minimum_fee() {
        let quote = calculate_cleaning_price(
            0,
            0,
            CleaningType::Regular,
            PropertyType::Apartment,
            CleaningFrequency::Weekly,
            Decimal::ZERO,
        );
        assert_eq!(quote.total_price, MINIMUM_FEE);
    }

    #[test]
    fn test_huge_room_count_does_not_overflow() {
        let quote = calculate_cleaning_price(
            2_000_000_000,
            u32::MAX,
            CleaningType::PostConstruction,
            PropertyType::Commercial,
            CleaningFrequency::OneTime,
            dec!(70000000000000000000000000000),
        );
        assert!(quote.total_price > MINIMUM_FEE);
    }

    #[test]
    fn test_type_wire_names() {
        let parsed: CleaningType = serde_json::from_str("\"move_in_out\"").unwrap();
        assert_eq!(parsed, CleaningType::MoveInOut);
        let parsed: CleaningFrequency = serde_json::from_str("\"bi_weekly\"").unwrap();
        assert_eq!(parsed, CleaningFrequency::BiWeekly);
    }
}
