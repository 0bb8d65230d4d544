//! Reset-password page
//!
//! Reached from a recovery email. The page is usable once a session exists
//! or a `PASSWORD_RECOVERY` event has been seen.

use tracing::info;

use super::form::{PendingFlag, SubmitOutcome};
use crate::application::{AuthProvider, LOGIN_PATH};
use crate::domain::AuthEvent;
use crate::notifications::AuthEventSubscriber;
use crate::shared::{AdminError, AdminResult};

pub const INVALID_LINK: &str = "Invalid or expired reset link. Please request a new one.";
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetPasswordForm {
    pub password: String,
    pub confirm_password: String,
}

impl ResetPasswordForm {
    pub fn check(&self) -> AdminResult<()> {
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AdminError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }
        if self.password != self.confirm_password {
            return Err(AdminError::Validation("Passwords don't match".to_string()));
        }
        Ok(())
    }
}

pub struct ResetPasswordPage {
    auth: AuthProvider,
    events: Option<AuthEventSubscriber>,
    has_valid_token: bool,
    pub form: ResetPasswordForm,
    pending: PendingFlag,
    error: Option<String>,
    success: bool,
}

impl ResetPasswordPage {
    pub fn new(auth: AuthProvider) -> Self {
        Self {
            auth,
            events: None,
            has_valid_token: false,
            form: ResetPasswordForm::default(),
            pending: PendingFlag::new(),
            error: None,
            success: false,
        }
    }

    /// Start listening for auth events, then look for an existing session.
    pub async fn init(&mut self) {
        self.events = Some(self.auth.subscribe());
        match self.auth.session().await {
            Ok(Some(_)) => self.has_valid_token = true,
            Ok(None) | Err(_) => self.error = Some(INVALID_LINK.to_string()),
        }
    }

    /// Adopt the session carried by the recovery link.
    pub async fn accept_redirect(&mut self, url: &str) -> AdminResult<()> {
        if let Err(err) = self.auth.restore_from_redirect(url).await {
            self.error = Some(err.to_string());
            return Err(err);
        }
        self.poll_events();
        Ok(())
    }

    /// Drain queued auth events.
    pub fn poll_events(&mut self) {
        let Some(events) = self.events.as_mut() else {
            return;
        };
        while let Some(message) = events.try_recv() {
            if let AuthEvent::PasswordRecovery { user_id } = message.event {
                info!(user_id = %user_id, "Password recovery session detected");
                self.has_valid_token = true;
                self.error = None;
            }
        }
    }

    pub fn has_valid_token(&self) -> bool {
        self.has_valid_token
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub async fn submit(&mut self) -> SubmitOutcome {
        let Some(_guard) = self.pending.try_begin() else {
            return SubmitOutcome::Busy;
        };
        self.poll_events();
        if !self.has_valid_token {
            return SubmitOutcome::Invalid(INVALID_LINK.to_string());
        }
        self.error = None;

        let result = match self.form.check() {
            Ok(()) => self.auth.update_password(&self.form.password).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(()) => {
                self.success = true;
                SubmitOutcome::Navigate(LOGIN_PATH.to_string())
            }
            Err(err) => {
                let outcome = SubmitOutcome::from_error(&err);
                self.error = outcome.error_message().map(str::to_string);
                outcome
            }
        }
    }
}
