//! Course phase entity (`course_phases` table)
//!
//! Phase numbers order the phases of a course. Sequential numbering is
//! only suggested when a phase is added; the backend does not enforce it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoursePhase {
    pub id: String,
    pub course_id: String,
    pub phase_number: i32,
    pub phase_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration_weeks: Option<i32>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert / update payload for a phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseValues {
    pub course_id: String,
    pub phase_number: i32,
    pub phase_name: String,
    pub duration_weeks: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn numeric_price_decodes_from_json_number() {
        let phase: CoursePhase = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "course_id": "c1",
            "phase_number": 1,
            "phase_name": "Fundamentals",
            "duration_weeks": 4,
            "price": 15000.5
        }))
        .unwrap();
        assert_eq!(phase.price, Decimal::from_str("15000.5").unwrap());
    }

    #[test]
    fn values_serialize_price_as_number() {
        let values = PhaseValues {
            course_id: "c1".into(),
            phase_number: 2,
            phase_name: "Advanced".into(),
            duration_weeks: 6,
            price: Decimal::from(20000),
        };
        let json = serde_json::to_value(&values).unwrap();
        assert_eq!(json["price"], serde_json::json!(20000.0));
    }
}
