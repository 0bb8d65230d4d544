//! Read-only aggregate views maintained by the backend.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::UserRole;

/// Views the console may read but never write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportView {
    EnrollmentStats,
    RevenueSummary,
    UserStats,
}

impl ReportView {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnrollmentStats => "enrollment_stats",
            Self::RevenueSummary => "revenue_summary",
            Self::UserStats => "user_stats",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentStats {
    #[serde(default)]
    pub course_title: Option<String>,
    #[serde(default)]
    pub phase_name: Option<String>,
    #[serde(default)]
    pub total_enrollments: Option<i64>,
    #[serde(default)]
    pub paid_enrollments: Option<i64>,
    #[serde(default)]
    pub pending_enrollments: Option<i64>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_revenue: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueSummary {
    #[serde(default)]
    pub payment_day: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub total_payments: Option<i64>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_revenue: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub total_users: Option<i64>,
    #[serde(default)]
    pub active_users: Option<i64>,
    #[serde(default)]
    pub inactive_users: Option<i64>,
}
