//! Service request model
//!
//! A realtor's order for staging, cleaning, video or social media work.
//! The kind-specific inputs live in [`ServiceDetails`] and double as the
//! pricing inputs.

use super::credit::CreditType;
use crate::error::AppError;
use crate::pricing::{
    self, calculate_cleaning_price, calculate_social_price, calculate_staging_fee,
    calculate_video_price, CleaningFrequency, CleaningType, PostingFrequency, PropertyType, Quote,
    SocialAddon, SubscriptionTerm, VideoAddon, VideoServiceType,
};
use crate::AppResult;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Service category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Staging,
    Cleaning,
    Video,
    Social,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::Staging => write!(f, "staging"),
            ServiceKind::Cleaning => write!(f, "cleaning"),
            ServiceKind::Video => write!(f, "video"),
            ServiceKind::Social => write!(f, "social"),
        }
    }
}

impl ServiceKind {
    /// Parse from string (case-insensitive), accepting plural path segments
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "staging" | "stagings" => Some(ServiceKind::Staging),
            "cleaning" | "cleanings" => Some(ServiceKind::Cleaning),
            "video" | "videos" => Some(ServiceKind::Video),
            "social" | "socials" => Some(ServiceKind::Social),
            _ => None,
        }
    }

    /// Ledger category used when paying for this kind
    pub fn credit_type(&self) -> CreditType {
        match self {
            ServiceKind::Staging => CreditType::Staging,
            ServiceKind::Cleaning => CreditType::Cleaning,
            ServiceKind::Video => CreditType::Video,
            ServiceKind::Social => CreditType::Social,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServiceKind::Staging => "Home Staging",
            ServiceKind::Cleaning => "Cleaning",
            ServiceKind::Video => "Video Editing",
            ServiceKind::Social => "Social Media Management",
        }
    }

    pub fn all() -> [ServiceKind; 4] {
        [
            ServiceKind::Staging,
            ServiceKind::Cleaning,
            ServiceKind::Video,
            ServiceKind::Social,
        ]
    }
}

/// Service request lifecycle
///
/// `draft -> submitted -> confirmed -> paid -> scheduled -> completed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    #[default]
    Draft,
    Submitted,
    Confirmed,
    Paid,
    Scheduled,
    Completed,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceStatus::Draft => "draft",
            ServiceStatus::Submitted => "submitted",
            ServiceStatus::Confirmed => "confirmed",
            ServiceStatus::Paid => "paid",
            ServiceStatus::Scheduled => "scheduled",
            ServiceStatus::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

impl ServiceStatus {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(ServiceStatus::Draft),
            "submitted" => Some(ServiceStatus::Submitted),
            "confirmed" => Some(ServiceStatus::Confirmed),
            "paid" => Some(ServiceStatus::Paid),
            "scheduled" => Some(ServiceStatus::Scheduled),
            "completed" => Some(ServiceStatus::Completed),
            _ => None,
        }
    }

    /// Whether an admin may move a request from `self` to `target`
    ///
    /// Moves are forward only. `paid` is reached through a credit charge,
    /// never set by hand, and cannot be skipped.
    pub fn admin_can_move_to(&self, target: ServiceStatus) -> bool {
        if target <= *self || target == ServiceStatus::Paid {
            return false;
        }
        target < ServiceStatus::Paid || *self >= ServiceStatus::Paid
    }

    /// Whether the owner may still withdraw the request
    pub fn is_withdrawable(&self) -> bool {
        matches!(self, ServiceStatus::Draft | ServiceStatus::Submitted)
    }
}

/// Kind-specific inputs of a service request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ServiceDetails {
    Staging {
        location: String,
        size: Decimal,
        rooms: u32,
        months: u32,
        #[serde(default)]
        property_type: PropertyType,
        #[serde(default)]
        occupation_status: Option<String>,
        #[serde(default)]
        selling_price: Option<Decimal>,
        #[serde(default)]
        custom_price: Option<Decimal>,
    },
    Cleaning {
        location: String,
        #[serde(default)]
        size: Decimal,
        rooms: u32,
        bathrooms: u32,
        #[serde(default)]
        cleaning_type: CleaningType,
        #[serde(default)]
        property_type: PropertyType,
        #[serde(default)]
        frequency: CleaningFrequency,
        #[serde(default)]
        special_requests: Option<String>,
        #[serde(default)]
        scheduled_date: Option<NaiveDate>,
        #[serde(default)]
        custom_price: Option<Decimal>,
    },
    Video {
        service_type: VideoServiceType,
        #[serde(default)]
        addons: Vec<VideoAddon>,
        number_of_videos: u32,
        #[serde(default)]
        custom_price: Option<Decimal>,
    },
    Social {
        frequency: PostingFrequency,
        subscription: SubscriptionTerm,
        #[serde(default)]
        addons: Vec<SocialAddon>,
        #[serde(default)]
        platforms: Vec<String>,
        #[serde(default)]
        custom_price: Option<Decimal>,
    },
}

impl ServiceDetails {
    pub fn kind(&self) -> ServiceKind {
        match self {
            ServiceDetails::Staging { .. } => ServiceKind::Staging,
            ServiceDetails::Cleaning { .. } => ServiceKind::Cleaning,
            ServiceDetails::Video { .. } => ServiceKind::Video,
            ServiceDetails::Social { .. } => ServiceKind::Social,
        }
    }

    fn custom_price(&self) -> Option<Decimal> {
        match self {
            ServiceDetails::Staging { custom_price, .. }
            | ServiceDetails::Cleaning { custom_price, .. }
            | ServiceDetails::Video { custom_price, .. }
            | ServiceDetails::Social { custom_price, .. } => *custom_price,
        }
    }

    /// Price these inputs with the matching calculator
    ///
    /// # Errors
    /// Returns `AppError::Validation` for a negative custom price or inputs
    /// outside the calculator bounds.
    pub fn quote(&self) -> AppResult<Quote> {
        pricing::check_custom_price(self.custom_price())?;
        if let Some(price) = pricing::custom_override(self.custom_price()) {
            return Ok(Quote::fixed(price));
        }

        match self {
            ServiceDetails::Staging {
                size,
                rooms,
                months,
                property_type,
                ..
            } => {
                let q = calculate_staging_fee(*size, *rooms, *months, *property_type)?;
                Ok(Quote {
                    total: q.total_cost,
                    requires_quote: false,
                    breakdown: q.breakdown,
                })
            }
            ServiceDetails::Cleaning {
                size,
                rooms,
                bathrooms,
                cleaning_type,
                property_type,
                frequency,
                ..
            } => {
                pricing::check_at_most("rooms", *rooms, pricing::MAX_ROOMS)?;
                pricing::check_at_most("bathrooms", *bathrooms, pricing::MAX_ROOMS)?;
                pricing::check_size(*size)?;
                let q = calculate_cleaning_price(
                    *rooms,
                    *bathrooms,
                    *cleaning_type,
                    *property_type,
                    *frequency,
                    *size,
                );
                Ok(Quote {
                    total: q.total_price,
                    requires_quote: false,
                    breakdown: q.breakdown,
                })
            }
            ServiceDetails::Video {
                service_type,
                addons,
                number_of_videos,
                ..
            } => {
                let q = calculate_video_price(*service_type, addons, *number_of_videos, None)?;
                Ok(Quote {
                    total: q.total_price,
                    requires_quote: q.requires_quote,
                    breakdown: q.breakdown,
                })
            }
            ServiceDetails::Social {
                frequency,
                subscription,
                addons,
                ..
            } => {
                let q = calculate_social_price(*frequency, *subscription, addons, None);
                Ok(Quote {
                    total: q.total_price,
                    requires_quote: false,
                    breakdown: q.breakdown,
                })
            }
        }
    }
}

/// One entry of a request's status history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: ServiceStatus,
    pub to: ServiceStatus,
    pub note: Option<String>,
    pub changed_by: Uuid,
    pub changed_at: DateTime<Utc>,
}

/// Service request entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: ServiceKind,
    pub status: ServiceStatus,
    pub details: ServiceDetails,

    /// Calculator price at submission
    pub estimate_price: Option<Decimal>,

    /// Admin price override
    pub quotation_price: Option<Decimal>,

    pub notes: Option<String>,
    pub history: Vec<StatusChange>,
    pub is_admin_unread: bool,
    pub is_user_unread: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceRequest {
    /// Price the realtor pays: the quotation when set, else the estimate
    ///
    /// Only positive amounts count as a price.
    pub fn price(&self) -> Option<Decimal> {
        self.quotation_price
            .filter(|p| *p > Decimal::ZERO)
            .or(self.estimate_price.filter(|p| *p > Decimal::ZERO))
    }

    /// Price in whole credits, rounded up
    pub fn payable_credits(&self) -> AppResult<i64> {
        let price = self.price().ok_or_else(|| {
            AppError::InvalidInput(format!("service request {} has no price yet", self.id))
        })?;
        price
            .ceil()
            .to_i64()
            .ok_or_else(|| AppError::InvalidInput(format!("price {} out of range", price)))
    }
}

/// Fields for a new service request
#[derive(Debug, Clone)]
pub struct NewServiceRequest {
    pub user_id: Uuid,
    pub details: ServiceDetails,
    pub estimate_price: Option<Decimal>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(estimate: Option<Decimal>, quotation: Option<Decimal>) -> ServiceRequest {
        let now = Utc::now();
        ServiceRequest {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            kind: ServiceKind::Video,
            status: ServiceStatus::Confirmed,
            details: ServiceDetails::Video {
                service_type: VideoServiceType::SocialMediaShort,
                addons: vec![],
                number_of_videos: 3,
                custom_price: None,
            },
            estimate_price: estimate,
            quotation_price: quotation,
            notes: None,
            history: vec![],
            is_admin_unread: true,
            is_user_unread: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_admin_transitions() {
        use ServiceStatus::*;
        assert!(Submitted.admin_can_move_to(Confirmed));
        assert!(Paid.admin_can_move_to(Scheduled));
        assert!(Paid.admin_can_move_to(Completed));
        assert!(!Confirmed.admin_can_move_to(Paid));
        assert!(!Confirmed.admin_can_move_to(Scheduled));
        assert!(!Scheduled.admin_can_move_to(Submitted));
        assert!(!Completed.admin_can_move_to(Completed));
    }

    #[test]
    fn test_tagged_details_deserialize() {
        let json = r#"{"kind":"video","service_type":"social_media_short","number_of_videos":3}"#;
        let details: ServiceDetails = serde_json::from_str(json).unwrap();
        assert_eq!(details.kind(), ServiceKind::Video);
        assert_eq!(details.quote().unwrap().total, dec!(360));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let json = r#"{"kind":"listing","location":"Toronto"}"#;
        assert!(serde_json::from_str::<ServiceDetails>(json).is_err());
    }

    #[test]
    fn test_custom_price_overrides_calculator() {
        let details = ServiceDetails::Staging {
            location: "Toronto".to_string(),
            size: dec!(1500),
            rooms: 4,
            months: 2,
            property_type: PropertyType::House,
            occupation_status: None,
            selling_price: None,
            custom_price: Some(dec!(2500)),
        };
        let quote = details.quote().unwrap();
        assert_eq!(quote.total, dec!(2500));
        assert_eq!(quote.breakdown.len(), 1);
    }

    #[test]
    fn test_negative_custom_price_rejected() {
        let json = r#"{"kind":"staging","location":"Toronto","size":"1500","rooms":4,"months":2,"custom_price":"-500"}"#;
        let details: ServiceDetails = serde_json::from_str(json).unwrap();
        assert!(matches!(details.quote(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_oversized_inputs_rejected_not_panicking() {
        let staging = r#"{"kind":"staging","location":"Toronto","size":"70000000000000000000000000000","months":4000000000,"rooms":2}"#;
        let details: ServiceDetails = serde_json::from_str(staging).unwrap();
        assert!(matches!(details.quote(), Err(AppError::Validation(_))));

        let cleaning = r#"{"kind":"cleaning","location":"Toronto","rooms":2000000000,"bathrooms":2}"#;
        let details: ServiceDetails = serde_json::from_str(cleaning).unwrap();
        assert!(matches!(details.quote(), Err(AppError::Validation(_))));

        let video = r#"{"kind":"video","service_type":"listing_video","number_of_videos":4000000000}"#;
        let details: ServiceDetails = serde_json::from_str(video).unwrap();
        assert!(matches!(details.quote(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_negative_estimate_is_not_a_price() {
        assert_eq!(request(Some(dec!(-500)), None).price(), None);
        assert!(request(Some(dec!(-500)), None).payable_credits().is_err());
    }

    #[test]
    fn test_payable_credits_prefers_quotation() {
        assert_eq!(
            request(Some(dec!(360)), Some(dec!(300.25))).payable_credits().unwrap(),
            301
        );
        assert_eq!(request(Some(dec!(360)), None).payable_credits().unwrap(), 360);
        assert_eq!(
            request(Some(dec!(360)), Some(dec!(0))).payable_credits().unwrap(),
            360
        );
        assert!(request(None, None).payable_credits().is_err());
    }

    #[test]
    fn test_kind_from_path_segment() {
        assert_eq!(ServiceKind::from_str("stagings"), Some(ServiceKind::Staging));
        assert_eq!(ServiceKind::from_str("listings"), None);
        assert_eq!(ServiceKind::Social.credit_type(), CreditType::Social);
    }
}
