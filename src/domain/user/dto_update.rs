use serde::Serialize;

use super::UserRole;

/// Patch for a `users` row. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateUserDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}
