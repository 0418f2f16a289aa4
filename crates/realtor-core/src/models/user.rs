//! User profile model
//!
//! Realtors and admins share one profile table. The `credits` column is the
//! denormalized balance of the user's settled ledger rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// User role enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Realtor ordering services
    #[default]
    Realtor,
    /// Back-office administrator
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Realtor => write!(f, "realtor"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl UserRole {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "realtor" => Some(UserRole::Realtor),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }

    /// Check if role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// User profile entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique identifier
    pub id: Uuid,

    /// Login email (unique)
    pub email: String,

    /// Password hash (never expose in API responses)
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub brokerage: Option<String>,

    /// Real estate council registration number
    pub reco_number: Option<String>,

    pub role: UserRole,

    /// Set by an admin before the realtor may submit service requests
    pub realtor_approved: bool,

    /// Denormalized credit balance
    pub credits: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Get full name, falling back to the email address
    pub fn full_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.email.clone(),
        }
    }

    /// Check if user can perform admin actions
    pub fn can_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Check if the user may submit service requests
    pub fn can_order_services(&self) -> bool {
        self.role == UserRole::Realtor && self.realtor_approved
    }

    /// Check whether the balance covers a charge
    #[inline]
    pub fn can_afford(&self, credits: i64) -> bool {
        self.credits >= credits
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: String::new(),
            password_hash: String::new(),
            first_name: None,
            last_name: None,
            phone: None,
            brokerage: None,
            reco_number: None,
            role: UserRole::Realtor,
            realtor_approved: false,
            credits: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields supplied at registration
#[derive(Debug, Clone)]
pub struct NewUserProfile {
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub brokerage: Option<String>,
    pub reco_number: Option<String>,
}
