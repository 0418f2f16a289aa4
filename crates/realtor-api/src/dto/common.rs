//! Response envelope and paging shared by every handler

use realtor_core::traits::{PaginatedResponse, PaginationMeta};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// `{data, message?}` envelope around every successful response
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            data,
            message: None,
        }
    }

    /// Success with a note for the user, e.g. after redeeming a coupon
    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: Some(message.into()),
        }
    }
}

/// `?page=&per_page=` on the admin and service listings
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaginationParams {
    /// 1-based
    #[serde(default = "first_page", deserialize_with = "lenient_i64")]
    #[validate(range(min = 1))]
    pub page: i64,

    #[serde(default = "default_per_page", deserialize_with = "lenient_i64")]
    #[validate(range(min = 1, max = 200))]
    pub per_page: i64,
}

/// Accepts `3` as well as `"3"`; the dashboard sends page numbers as strings
fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn first_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    50
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: first_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationParams {
    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    #[inline]
    pub fn limit(&self) -> i64 {
        self.per_page
    }

    /// Wrap one page of rows with its paging metadata
    pub fn paginate<T>(&self, data: Vec<T>, total: i64) -> PaginatedResponse<T> {
        PaginatedResponse {
            data,
            pagination: PaginationMeta::new(total, self.page, self.per_page),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_and_limit() {
        let first = PaginationParams::default();
        assert_eq!((first.offset(), first.limit()), (0, 50));

        let third = PaginationParams {
            page: 3,
            per_page: 20,
        };
        assert_eq!(third.offset(), 40);
    }

    #[test]
    fn test_page_numbers_as_strings() {
        let params: PaginationParams =
            serde_json::from_str(r#"{"page": " 2 ", "per_page": 25}"#).unwrap();
        assert_eq!(params.offset(), 25);

        let page = params.paginate(vec!["a", "b", "c"], 28);
        assert_eq!(page.pagination.total_pages, 2);
        assert_eq!(page.data.len(), 3);

        assert!(serde_json::from_str::<PaginationParams>(r#"{"page": "two"}"#).is_err());
    }

    #[test]
    fn test_per_page_bounds() {
        let params = PaginationParams {
            page: 1,
            per_page: 500,
        };
        assert!(params.validate().is_err());
        assert!(PaginationParams::default().validate().is_ok());
    }

    #[test]
    fn test_envelope_omits_empty_message() {
        let json = serde_json::to_value(ApiResponse::success(7)).unwrap();
        assert_eq!(json, serde_json::json!({"data": 7}));

        let json = serde_json::to_value(ApiResponse::with_message(7, "Coupon redeemed")).unwrap();
        assert_eq!(json["message"], "Coupon redeemed");
    }
}
