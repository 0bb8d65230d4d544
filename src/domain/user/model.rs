//! User profile entity (`users` table)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User role
///
/// Unknown role strings coming back from the backend decode as
/// [`UserRole::Student`], the canonical default used everywhere a role is
/// missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum UserRole {
    Admin,
    Tutor,
    #[default]
    Student,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [UserRole::Admin, UserRole::Tutor, UserRole::Student];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Tutor => "tutor",
            Self::Student => "student",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Tutor => "Tutor",
            Self::Student => "Student",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "tutor" => Some(Self::Tutor),
            "student" => Some(Self::Student),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Admins and tutors may use the console.
    pub fn is_staff(&self) -> bool {
        matches!(self, Self::Admin | Self::Tutor)
    }
}

impl From<String> for UserRole {
    fn from(s: String) -> Self {
        Self::parse(&s).unwrap_or_default()
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User profile row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl User {
    /// Avatar letter shown next to the name.
    pub fn initial(&self) -> char {
        self.full_name
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('U')
    }
}
