//! Authenticated session and the identity shown in the layout chrome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserRole;

/// Account as known to the auth service (not the `users` profile row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Signed-in session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: AuthUser,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

/// Auth-state transitions published by the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn { user_id: String },
    SignedOut,
    TokenRefreshed { user_id: String },
    UserUpdated { user_id: String },
    /// A recovery link was followed; the holder may set a new password.
    PasswordRecovery { user_id: String },
}

impl AuthEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SignedIn { .. } => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
            Self::TokenRefreshed { .. } => "TOKEN_REFRESHED",
            Self::UserUpdated { .. } => "USER_UPDATED",
            Self::PasswordRecovery { .. } => "PASSWORD_RECOVERY",
        }
    }
}

/// Display profile of the signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: UserRole,
}

impl Identity {
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}
