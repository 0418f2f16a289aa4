//! Pricing calculators
//!
//! Pure functions turning service request inputs into a price and a
//! human-readable breakdown. All money math uses `Decimal`.
//!
//! A positive custom price always wins over the computed one; see
//! [`custom_override`]. Inputs are bounded by the `MAX_*` limits so the
//! money math stays inside `Decimal` range.

pub mod cleaning;
pub mod social;
pub mod staging;
pub mod video;

pub use cleaning::{calculate_cleaning_price, CleaningFrequency, CleaningQuote, CleaningType};
pub use social::{
    calculate_social_price, PostingFrequency, SocialAddon, SocialQuote, SubscriptionTerm,
};
pub use staging::{calculate_staging_fee, term_discount, StagingQuote};
pub use video::{calculate_video_price, VideoAddon, VideoQuote, VideoServiceType};

use crate::error::AppError;
use crate::AppResult;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest property size accepted, in square feet
pub const MAX_PROPERTY_SIZE: Decimal = dec!(1000000);

/// Largest room or bathroom count accepted
pub const MAX_ROOMS: u32 = 1_000;

/// Longest staging term accepted
pub const MAX_STAGING_MONTHS: u32 = 120;

/// Most videos in one order
pub const MAX_VIDEOS: u32 = 1_000;

/// Largest custom price accepted
pub const MAX_CUSTOM_PRICE: Decimal = dec!(10000000);

/// Property category shared by the staging and cleaning calculators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    #[default]
    House,
    Condo,
    Townhouse,
    Apartment,
    Commercial,
    Other,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PropertyType::House => "house",
            PropertyType::Condo => "condo",
            PropertyType::Townhouse => "townhouse",
            PropertyType::Apartment => "apartment",
            PropertyType::Commercial => "commercial",
            PropertyType::Other => "other",
        };
        write!(f, "{}", s)
    }
}

impl PropertyType {
    /// Parse from string (case-insensitive), unknown types map to `Other`
    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "house" => PropertyType::House,
            "condo" => PropertyType::Condo,
            "townhouse" => PropertyType::Townhouse,
            "apartment" => PropertyType::Apartment,
            "commercial" => PropertyType::Commercial,
            _ => PropertyType::Other,
        }
    }
}

/// Price summary common to every service kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub total: Decimal,

    /// Set when the service is priced manually by an admin
    pub requires_quote: bool,

    pub breakdown: Vec<String>,
}

impl Quote {
    /// Quote fixed by an explicit price
    pub fn fixed(total: Decimal) -> Self {
        Self {
            total,
            requires_quote: false,
            breakdown: vec![format!("Custom price: ${:.2}", total)],
        }
    }
}

/// Returns the custom price when one was given and is positive
#[inline]
pub fn custom_override(custom_price: Option<Decimal>) -> Option<Decimal> {
    custom_price.filter(|p| *p > Decimal::ZERO)
}

/// Reject a custom price that is negative or above [`MAX_CUSTOM_PRICE`]
pub fn check_custom_price(custom_price: Option<Decimal>) -> AppResult<()> {
    match custom_price {
        Some(p) if p.is_sign_negative() && !p.is_zero() => Err(AppError::Validation(
            "custom_price cannot be negative".to_string(),
        )),
        Some(p) if p > MAX_CUSTOM_PRICE => Err(AppError::Validation(format!(
            "custom_price cannot exceed {}",
            MAX_CUSTOM_PRICE
        ))),
        _ => Ok(()),
    }
}

/// Reject a count above `max`
pub(crate) fn check_at_most(field: &str, value: u32, max: u32) -> AppResult<()> {
    if value > max {
        return Err(AppError::Validation(format!(
            "{} cannot exceed {}",
            field, max
        )));
    }
    Ok(())
}

/// Reject a property size that is negative or above [`MAX_PROPERTY_SIZE`]
pub(crate) fn check_size(size: Decimal) -> AppResult<()> {
    if size.is_sign_negative() && !size.is_zero() {
        return Err(AppError::Validation(
            "property size cannot be negative".to_string(),
        ));
    }
    if size > MAX_PROPERTY_SIZE {
        return Err(AppError::Validation(format!(
            "property size cannot exceed {} sqft",
            MAX_PROPERTY_SIZE
        )));
    }
    Ok(())
}

/// Round a money amount to cents
#[inline]
pub(crate) fn money(value: Decimal) -> Decimal {
    value.round_dp(2)
}
