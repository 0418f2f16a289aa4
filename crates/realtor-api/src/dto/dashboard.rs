//! Dashboard DTOs

use realtor_core::models::ServiceKind;
use realtor_core::traits::ServiceCounts;
use serde::Serialize;
use std::collections::HashMap;

/// Dashboard summary
#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    /// Request counters per service kind, every kind present
    pub services: HashMap<ServiceKind, ServiceCounts>,

    /// Current balance
    pub credits_available: i64,

    /// Credits spent on services
    pub credits_used: i64,
}

impl DashboardResponse {
    /// Build from repository counters, filling kinds with no requests
    pub fn new(
        mut services: HashMap<ServiceKind, ServiceCounts>,
        credits_available: i64,
        credits_used: i64,
    ) -> Self {
        for kind in ServiceKind::all() {
            services.entry(kind).or_default();
        }
        Self {
            services,
            credits_available,
            credits_used,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_kinds_are_zeroed() {
        let mut counts = HashMap::new();
        counts.insert(
            ServiceKind::Video,
            ServiceCounts {
                total: 3,
                user_unread: 1,
                admin_unread: 0,
            },
        );

        let response = DashboardResponse::new(counts, 120, 80);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["services"]["video"]["total"], 3);
        assert_eq!(json["services"]["staging"]["total"], 0);
        assert_eq!(json["credits_available"], 120);
        assert_eq!(json["credits_used"], 80);
    }
}
