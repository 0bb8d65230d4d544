//! Badge variants and value formatting shared by list and detail pages.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeVariant {
    Admin,
    Student,
    Tutor,
    Active,
    Inactive,
    Pending,
    Completed,
    Failed,
    Tech,
    Marketing,
    Design,
}

impl BadgeVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Student => "student",
            Self::Tutor => "tutor",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Tech => "tech",
            Self::Marketing => "marketing",
            Self::Design => "design",
        }
    }
}

pub fn role_variant(role: &str) -> BadgeVariant {
    match role.to_lowercase().as_str() {
        "admin" => BadgeVariant::Admin,
        "tutor" => BadgeVariant::Tutor,
        _ => BadgeVariant::Student,
    }
}

/// Also accepts `true`/`false` for boolean flags.
pub fn status_variant(status: &str) -> BadgeVariant {
    match status.to_lowercase().as_str() {
        "active" | "true" => BadgeVariant::Active,
        "pending" => BadgeVariant::Pending,
        "completed" | "paid" => BadgeVariant::Completed,
        "failed" => BadgeVariant::Failed,
        _ => BadgeVariant::Inactive,
    }
}

pub fn category_variant(category: &str) -> BadgeVariant {
    match category.to_lowercase().as_str() {
        "marketing" => BadgeVariant::Marketing,
        "design" => BadgeVariant::Design,
        _ => BadgeVariant::Tech,
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `KES 15,000.00`
pub fn format_kes(amount: Decimal) -> String {
    let rounded = amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .abs();
    let text = format!("{:.2}", rounded);
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let sign = if amount.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}KES {}.{}", sign, group_thousands(whole), cents)
}

/// `Jan 5, 2025`
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%b %-d, %Y").to_string()
}

/// `Jan 5, 2025 at 3:07 PM`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%b %-d, %Y at %-I:%M %p").to_string()
}

pub fn format_optional_date(at: Option<DateTime<Utc>>) -> String {
    at.map(format_date).unwrap_or_else(|| "-".to_string())
}

pub fn weeks(count: i32) -> String {
    if count == 1 {
        "1 week".to_string()
    } else {
        format!("{} weeks", count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    #[test]
    fn kes_formatting() {
        assert_eq!(format_kes(Decimal::from(15000)), "KES 15,000.00");
        assert_eq!(format_kes(Decimal::from_str("1234567.891").unwrap()), "KES 1,234,567.89");
        assert_eq!(format_kes(Decimal::ZERO), "KES 0.00");
        assert_eq!(format_kes(Decimal::from_str("-950.5").unwrap()), "-KES 950.50");
    }

    #[test]
    fn dates() {
        let at = Utc.with_ymd_and_hms(2025, 1, 5, 15, 7, 0).unwrap();
        assert_eq!(format_date(at), "Jan 5, 2025");
        assert_eq!(format_timestamp(at), "Jan 5, 2025 at 3:07 PM");
        assert_eq!(format_optional_date(None), "-");
    }

    #[test]
    fn variants_default_sensibly() {
        assert_eq!(role_variant("ADMIN"), BadgeVariant::Admin);
        assert_eq!(role_variant("user"), BadgeVariant::Student);
        assert_eq!(status_variant("true"), BadgeVariant::Active);
        assert_eq!(status_variant("unknown"), BadgeVariant::Inactive);
        assert_eq!(category_variant("Design"), BadgeVariant::Design);
        assert_eq!(weeks(1), "1 week");
        assert_eq!(weeks(12), "12 weeks");
    }
}
