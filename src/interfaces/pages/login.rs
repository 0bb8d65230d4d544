//! Login page

use validator::Validate;

use super::form::{PendingFlag, SubmitOutcome};
use crate::application::{AuthProvider, HOME_PATH};
use crate::domain::Credentials;
use crate::shared::validate_form;

#[derive(Debug, Clone, Default, Validate)]
pub struct LoginForm {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

const ORDER: [&str; 2] = ["email", "password"];

pub struct LoginPage {
    auth: AuthProvider,
    pub form: LoginForm,
    pending: PendingFlag,
    error: Option<String>,
}

impl LoginPage {
    pub fn new(auth: AuthProvider) -> Self {
        Self {
            auth,
            form: LoginForm::default(),
            pending: PendingFlag::new(),
            error: None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_pending()
    }

    pub async fn submit(&mut self) -> SubmitOutcome {
        let Some(_guard) = self.pending.try_begin() else {
            return SubmitOutcome::Busy;
        };
        self.error = None;

        if let Err(err) = validate_form(&self.form, &ORDER) {
            let outcome = SubmitOutcome::from_error(&err);
            self.error = outcome.error_message().map(str::to_string);
            return outcome;
        }

        let credentials = Credentials {
            email: self.form.email.trim().to_string(),
            password: self.form.password.clone(),
        };
        let outcome = self.auth.login(&credentials).await;
        if outcome.success {
            SubmitOutcome::Navigate(outcome.redirect_to.unwrap_or_else(|| HOME_PATH.to_string()))
        } else {
            let message = outcome.error.unwrap_or_else(|| "Login failed".to_string());
            self.error = Some(message.clone());
            SubmitOutcome::Failed(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::pages::fixtures;

    #[tokio::test]
    async fn invalid_email_never_reaches_auth() {
        let fx = fixtures::signed_out().await;
        let mut events = fx.auth.subscribe();
        let mut page = LoginPage::new(fx.auth.clone());
        page.form.email = "grace".into();
        page.form.password = fixtures::PASSWORD.into();
        assert_eq!(
            page.submit().await,
            SubmitOutcome::Invalid("Please enter a valid email address".into())
        );
        assert!(events.try_recv().is_none());
        assert!(fx.auth.session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn wrong_password_shows_backend_message() {
        let fx = fixtures::signed_out().await;
        let mut page = LoginPage::new(fx.auth.clone());
        page.form.email = "grace@tecmarsign.test".into();
        page.form.password = "wrong-password".into();
        assert_eq!(
            page.submit().await,
            SubmitOutcome::Failed("Invalid login credentials".into())
        );
        assert_eq!(page.error(), Some("Invalid login credentials"));
    }

    #[tokio::test]
    async fn success_navigates_home() {
        let fx = fixtures::signed_out().await;
        let mut page = LoginPage::new(fx.auth.clone());
        page.form.email = "grace@tecmarsign.test".into();
        page.form.password = fixtures::PASSWORD.into();
        assert_eq!(page.submit().await, SubmitOutcome::Navigate("/".into()));
        assert!(page.error().is_none());
    }
}
