//! Video editing price calculator

use super::{check_at_most, check_custom_price, custom_override, money, MAX_VIDEOS};
use crate::error::AppError;
use crate::AppResult;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Video product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoServiceType {
    /// Social media short (up to 60 seconds)
    SocialMediaShort,
    /// Listing video (1 to 3 minutes)
    ListingVideo,
    AgentBranding,
    /// Custom long-form video (3+ minutes)
    CustomLongForm,
    /// Bulk editing package, always quoted by hand
    BulkPackage,
}

impl VideoServiceType {
    /// Unit price, `None` for custom-quote products
    pub fn base_price(&self) -> Option<Decimal> {
        match self {
            VideoServiceType::SocialMediaShort => Some(dec!(120)),
            VideoServiceType::ListingVideo => Some(dec!(180)),
            VideoServiceType::AgentBranding => Some(dec!(250)),
            VideoServiceType::CustomLongForm => Some(dec!(300)),
            VideoServiceType::BulkPackage => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VideoServiceType::SocialMediaShort => "Social Media Short",
            VideoServiceType::ListingVideo => "Listing Video",
            VideoServiceType::AgentBranding => "Agent Introduction / Branding Video",
            VideoServiceType::CustomLongForm => "Custom Long-Form Video",
            VideoServiceType::BulkPackage => "Bulk Editing Package",
        }
    }
}

/// Per-video add-on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoAddon {
    BilingualSubtitles,
    VoiceOverEditing,
}

impl VideoAddon {
    pub fn price(&self) -> Decimal {
        match self {
            VideoAddon::BilingualSubtitles => dec!(40),
            VideoAddon::VoiceOverEditing => dec!(60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoQuote {
    pub base_price: Decimal,
    pub addons_price: Decimal,
    pub total_price: Decimal,
    pub requires_quote: bool,
    pub breakdown: Vec<String>,
}

/// Calculate the price of a video order
///
/// `total = (base + sum(addons)) * number_of_videos`. Custom-quote products
/// price at zero with `requires_quote` set unless a custom price is given.
pub fn calculate_video_price(
    service_type: VideoServiceType,
    addons: &[VideoAddon],
    number_of_videos: u32,
    custom_price: Option<Decimal>,
) -> AppResult<VideoQuote> {
    if number_of_videos == 0 {
        return Err(AppError::Validation(
            "number_of_videos must be at least 1".to_string(),
        ));
    }
    check_at_most("number_of_videos", number_of_videos, MAX_VIDEOS)?;
    check_custom_price(custom_price)?;

    if let Some(price) = custom_override(custom_price) {
        return Ok(VideoQuote {
            base_price: price,
            addons_price: Decimal::ZERO,
            total_price: price,
            requires_quote: false,
            breakdown: vec![format!("Custom price: ${:.2}", price)],
        });
    }

    let base_price = match service_type.base_price() {
        Some(price) => price,
        None => {
            return Ok(VideoQuote {
                base_price: Decimal::ZERO,
                addons_price: Decimal::ZERO,
                total_price: Decimal::ZERO,
                requires_quote: true,
                breakdown: vec![format!("{}: custom quote", service_type.label())],
            })
        }
    };

    let addons_price: Decimal = addons.iter().map(VideoAddon::price).sum();
    let count = Decimal::from(number_of_videos);
    let total_price = money((base_price + addons_price) * count);

    let mut breakdown = vec![format!(
        "{}: ${:.2} x {}",
        service_type.label(),
        base_price,
        number_of_videos
    )];
    if !addons_price.is_zero() {
        breakdown.push(format!(
            "Add-ons: ${:.2} x {}",
            addons_price, number_of_videos
        ));
    }

    Ok(VideoQuote {
        base_price,
        addons_price,
        total_price,
        requires_quote: false,
        breakdown,
    })
}
