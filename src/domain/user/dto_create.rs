use serde::Serialize;

use super::UserRole;

/// Sign-up request for a new account.
///
/// The backend creates the `users` profile row from `metadata` through a
/// trigger, so the console never inserts into `users` directly.
#[derive(Debug, Clone)]
pub struct CreateUserDto {
    pub email: String,
    pub password: String,
    pub metadata: NewUserMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewUserMetadata {
    pub full_name: String,
    pub phone_number: String,
    pub role: UserRole,
}
