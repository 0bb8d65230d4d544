//! Payment entity (`payments` table)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Settlement state of a payment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum PaymentState {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl PaymentState {
    pub const ALL: [PaymentState; 3] = [Self::Pending, Self::Completed, Self::Failed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "completed" | "success" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl From<String> for PaymentState {
    fn from(s: String) -> Self {
        Self::parse(&s).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub enrollment_id: String,
    pub student_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub status: PaymentState,
    pub transaction_id: String,
    #[serde(default)]
    pub receipt_number: Option<String>,
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}
