//! Coupon administration DTOs

use chrono::{DateTime, NaiveDate, Utc};
use realtor_core::models::{CouponDraft, CouponScope};
use realtor_core::AppError;
use serde::Deserialize;
use validator::Validate;

/// Create or replace a coupon
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CouponRequest {
    /// Code, stored upper-cased
    #[validate(length(min = 1, max = 64, message = "Coupon name is required"))]
    pub name: String,

    /// Credits granted
    #[validate(range(min = 1, message = "Credits must be positive"))]
    pub credits: i64,

    /// Service category the coupon discounts
    #[serde(default)]
    pub tp: CouponScope,

    #[serde(default = "default_active")]
    pub active: bool,

    pub description: Option<String>,

    /// Distinct users allowed; empty or zero means unlimited
    #[validate(range(min = 0))]
    pub usage_limit: Option<i32>,

    /// RFC 3339 timestamp or `YYYY-MM-DD`; an empty string clears it
    #[serde(default)]
    pub expires_at: Option<String>,
}

fn default_active() -> bool {
    true
}

impl CouponRequest {
    /// Convert into the draft the coupon engine stores
    pub fn into_draft(self) -> Result<CouponDraft, AppError> {
        let expires_at = parse_expiry(self.expires_at.as_deref())?;
        Ok(CouponDraft {
            name: self.name,
            credits: self.credits,
            tp: self.tp,
            active: self.active,
            description: self.description,
            usage_limit: self.usage_limit,
            expires_at,
        })
    }
}

/// Plain dates expire at the end of that day (UTC)
fn parse_expiry(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, AppError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .map(|dt| Some(dt.and_utc()))
        .ok_or_else(|| AppError::Validation(format!("Invalid expires_at: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn request(expires_at: Option<&str>) -> CouponRequest {
        CouponRequest {
            name: "welcome".to_string(),
            credits: 100,
            tp: CouponScope::General,
            active: true,
            description: None,
            usage_limit: None,
            expires_at: expires_at.map(str::to_string),
        }
    }

    #[test]
    fn test_empty_expiry_is_none() {
        assert!(request(Some("")).into_draft().unwrap().expires_at.is_none());
        assert!(request(None).into_draft().unwrap().expires_at.is_none());
    }

    #[test]
    fn test_plain_date_expires_end_of_day() {
        let draft = request(Some("2030-01-31")).into_draft().unwrap();
        let expires = draft.expires_at.unwrap();
        assert_eq!(expires.day(), 31);
        assert_eq!(expires.hour(), 23);
    }

    #[test]
    fn test_rfc3339_expiry() {
        let draft = request(Some("2030-06-01T12:00:00-04:00"))
            .into_draft()
            .unwrap();
        assert_eq!(draft.expires_at.unwrap().hour(), 16);
    }

    #[test]
    fn test_garbage_expiry_rejected() {
        assert!(matches!(
            request(Some("next tuesday")).into_draft(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_defaults() {
        let req: CouponRequest =
            serde_json::from_str(r#"{"name": "spring", "credits": 25}"#).unwrap();
        assert!(req.active);
        assert_eq!(req.tp, CouponScope::General);
        assert!(req.validate().is_ok());
    }
}
