//! Enrollment entity (`enrollments` table)
//!
//! Links a student to a course phase and records whether access has been
//! granted after payment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payment state of an enrollment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 3] = [Self::Pending, Self::Paid, Self::Failed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "paid" | "completed" => Some(Self::Paid),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(s: String) -> Self {
        Self::parse(&s).unwrap_or_default()
    }
}

/// Name fragments embedded through `select=*,users(full_name),...`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedName {
    #[serde(default, alias = "full_name", alias = "title", alias = "phase_name")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: String,
    pub student_id: String,
    pub course_id: String,
    pub phase_id: String,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub access_granted: Option<bool>,
    #[serde(default)]
    pub enrollment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "users", skip_serializing)]
    pub student: Option<EmbeddedName>,
    #[serde(default, rename = "courses", skip_serializing)]
    pub course: Option<EmbeddedName>,
    #[serde(default, rename = "course_phases", skip_serializing)]
    pub phase: Option<EmbeddedName>,
}

impl Enrollment {
    pub fn has_access(&self) -> bool {
        self.access_granted.unwrap_or(false)
    }

    /// Access granted and not past its expiry.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.has_access() && self.expires_at.map_or(true, |exp| exp > now)
    }

    pub fn student_name(&self) -> &str {
        embedded(&self.student, &self.student_id)
    }

    pub fn course_title(&self) -> &str {
        embedded(&self.course, &self.course_id)
    }

    pub fn phase_name(&self) -> &str {
        embedded(&self.phase, &self.phase_id)
    }
}

fn embedded<'a>(value: &'a Option<EmbeddedName>, fallback: &'a str) -> &'a str {
    value
        .as_ref()
        .and_then(|v| v.name.as_deref())
        .unwrap_or(fallback)
}

/// Insert / update payload for an enrollment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrollmentValues {
    pub student_id: String,
    pub course_id: String,
    pub phase_id: String,
    pub payment_status: PaymentStatus,
    pub access_granted: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> Enrollment {
        serde_json::from_value(serde_json::json!({
            "id": "e1",
            "student_id": "u1",
            "course_id": "c1",
            "phase_id": "p1",
            "payment_status": "paid",
            "access_granted": true,
            "users": { "full_name": "Jane Doe" },
            "courses": { "title": "Web Development" }
        }))
        .unwrap()
    }

    #[test]
    fn embedded_names_fall_back_to_ids() {
        let e = sample();
        assert_eq!(e.student_name(), "Jane Doe");
        assert_eq!(e.course_title(), "Web Development");
        assert_eq!(e.phase_name(), "p1");
        assert_eq!(e.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn expired_access_is_not_active() {
        let mut e = sample();
        let now = Utc::now();
        assert!(e.is_active_at(now));
        e.expires_at = Some(now - Duration::days(1));
        assert!(!e.is_active_at(now));
        e.expires_at = None;
        e.access_granted = Some(false);
        assert!(!e.is_active_at(now));
    }
}
