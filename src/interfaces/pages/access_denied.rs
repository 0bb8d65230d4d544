//! Shown to signed-in users without a staff role.

use crate::application::{AuthOutcome, AuthProvider};

pub const TITLE: &str = "Access Denied";
pub const MESSAGE: &str = "You don't have permission to access the admin dashboard. Only administrators can access this area.";
pub const SIGN_OUT_LABEL: &str = "Sign Out & Try Different Account";

pub struct AccessDeniedPage {
    auth: AuthProvider,
}

impl AccessDeniedPage {
    pub fn new(auth: AuthProvider) -> Self {
        Self { auth }
    }

    pub async fn sign_out(&self) -> AuthOutcome {
        self.auth.logout().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;
    use crate::interfaces::pages::fixtures;

    #[tokio::test]
    async fn sign_out_returns_to_login() {
        let fx = fixtures::signed_in(UserRole::Student).await;
        let page = AccessDeniedPage::new(fx.auth.clone());
        let outcome = page.sign_out().await;
        assert!(outcome.success);
        assert_eq!(outcome.redirect_to.as_deref(), Some("/login"));
        assert!(fx.auth.session().await.unwrap().is_none());
    }
}
