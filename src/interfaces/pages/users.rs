//! Users: list, create (sign-up) and edit

use tracing::info;
use validator::Validate;

use super::form::{non_blank, Choice, PendingFlag, SubmitOutcome};
use super::list::ListQuery;
use crate::application::{AuthProvider, Resource};
use crate::domain::{
    CreateUserDto, Filter, Identity, NewUserMetadata, UpdateUserDto, User, UserRole,
};
use crate::shared::{validate_form, AdminError, AdminResult, KENYAN_PHONE};

pub const SEARCH_FIELDS: [&str; 3] = ["full_name", "email", "phone_number"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilters {
    pub search: String,
    pub role: Choice<UserRole>,
    /// `true` = active.
    pub status: Choice<bool>,
}

impl UserFilters {
    pub fn parse_status(value: &str) -> Option<bool> {
        match value {
            "active" => Some(true),
            "inactive" => Some(false),
            _ => None,
        }
    }
}

impl ListQuery for UserFilters {
    type Row = User;
    const RESOURCE: Resource = Resource::Users;

    fn filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(term) = non_blank(&self.search) {
            filters.push(Filter::search(SEARCH_FIELDS, &term));
        }
        if let Some(role) = self.role.selected() {
            filters.push(Filter::eq("role", role.as_str()));
        }
        if let Some(active) = self.status.selected() {
            filters.push(Filter::eq("is_active", *active));
        }
        filters
    }
}

// ── Create ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Validate)]
pub struct CreateUserForm {
    #[validate(length(min = 3, message = "Full name must be at least 3 characters"))]
    pub full_name: String,
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(regex(path = *KENYAN_PHONE, message = "Phone must be in format +254XXXXXXXXX"))]
    pub phone_number: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub role: UserRole,
    pub is_active: bool,
}

impl CreateUserForm {
    /// The values that get written: text fields trimmed.
    fn trimmed(&self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            ..self.clone()
        }
    }
}

impl Default for CreateUserForm {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            email: String::new(),
            phone_number: String::new(),
            password: String::new(),
            role: UserRole::Student,
            is_active: true,
        }
    }
}

const CREATE_ORDER: [&str; 4] = ["full_name", "email", "phone_number", "password"];

/// New accounts go through sign-up; the profile row is written by the
/// backend from the metadata. The signed-in admin keeps their session.
pub struct CreateUserPage {
    auth: AuthProvider,
    pub form: CreateUserForm,
    saving: PendingFlag,
    error: Option<String>,
}

impl CreateUserPage {
    pub fn new(auth: AuthProvider) -> Self {
        Self {
            auth,
            form: CreateUserForm::default(),
            saving: PendingFlag::new(),
            error: None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_saving(&self) -> bool {
        self.saving.is_pending()
    }

    pub async fn submit(&mut self) -> SubmitOutcome {
        let Some(_guard) = self.saving.try_begin() else {
            return SubmitOutcome::Busy;
        };
        let outcome = match self.create().await {
            Ok(()) => SubmitOutcome::Navigate(Resource::Users.list_path()),
            Err(err) => SubmitOutcome::from_error(&err),
        };
        self.error = outcome.error_message().map(str::to_string);
        outcome
    }

    async fn create(&self) -> AdminResult<()> {
        let form = self.form.trimmed();
        validate_form(&form, &CREATE_ORDER)?;

        let request = CreateUserDto {
            email: form.email,
            password: form.password,
            metadata: NewUserMetadata {
                full_name: form.full_name,
                phone_number: form.phone_number,
                role: form.role,
            },
        };
        let account = self.auth.sign_up(&request).await?;

        if !self.form.is_active {
            let patch = UpdateUserDto {
                is_active: Some(false),
                ..UpdateUserDto::default()
            };
            self.auth
                .data()
                .update(Resource::Users, &account.id, &patch)
                .await?;
        }
        info!(user_id = %account.id, role = %self.form.role, "User created");
        Ok(())
    }
}

// ── Edit ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Validate)]
pub struct EditUserForm {
    #[validate(length(min = 3, message = "Full name must be at least 3 characters"))]
    pub full_name: String,
    #[validate(regex(path = *KENYAN_PHONE, message = "Phone must be in format +254XXXXXXXXX"))]
    pub phone_number: String,
    pub role: UserRole,
    pub is_active: bool,
}

impl From<&User> for EditUserForm {
    fn from(user: &User) -> Self {
        Self {
            full_name: user.full_name.clone(),
            phone_number: user.phone_number.clone(),
            role: user.role,
            is_active: user.is_active,
        }
    }
}

impl EditUserForm {
    fn trimmed(&self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            ..self.clone()
        }
    }
}

const EDIT_ORDER: [&str; 2] = ["full_name", "phone_number"];

pub const ROLE_LOCKED_NOTE: &str = "Only admins can change user roles";
pub const STATUS_LOCKED_NOTE: &str = "Only admins can change account status";
pub const SELF_DEACTIVATE_NOTE: &str = "You cannot deactivate your own account";

pub struct EditUserPage {
    auth: AuthProvider,
    reset_redirect: String,
    user: Option<User>,
    viewer: Option<Identity>,
    pub form: EditUserForm,
    saving: PendingFlag,
    resetting: PendingFlag,
    error: Option<String>,
    saved: bool,
    reset_sent: bool,
}

impl EditUserPage {
    /// `reset_redirect` is where recovery links land, normally
    /// `<site_url>/reset-password`.
    pub fn new(auth: AuthProvider, reset_redirect: impl Into<String>) -> Self {
        Self {
            auth,
            reset_redirect: reset_redirect.into(),
            user: None,
            viewer: None,
            form: EditUserForm::default(),
            saving: PendingFlag::new(),
            resetting: PendingFlag::new(),
            error: None,
            saved: false,
            reset_sent: false,
        }
    }

    /// Fetch the user being edited and the signed-in viewer.
    pub async fn load(&mut self, id: &str) -> AdminResult<()> {
        let user: User = self.auth.data().one(Resource::Users, id).await?;
        self.viewer = self.auth.get_identity().await?;
        self.form = EditUserForm::from(&user);
        self.user = Some(user);
        self.saved = false;
        Ok(())
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    fn viewer_is_admin(&self) -> bool {
        self.viewer.as_ref().is_some_and(|v| v.role.is_admin())
    }

    fn editing_self(&self) -> bool {
        match (&self.viewer, &self.user) {
            (Some(viewer), Some(user)) => viewer.id == user.id,
            _ => false,
        }
    }

    pub fn role_editable(&self) -> bool {
        self.viewer_is_admin()
    }

    /// Admins only, own account included.
    pub fn active_editable(&self) -> bool {
        self.viewer_is_admin()
    }

    pub fn role_note(&self) -> Option<&'static str> {
        (!self.role_editable()).then_some(ROLE_LOCKED_NOTE)
    }

    pub fn active_note(&self) -> Option<&'static str> {
        match (self.active_editable(), self.editing_self()) {
            (true, _) => None,
            (false, true) => Some(SELF_DEACTIVATE_NOTE),
            (false, false) => Some(STATUS_LOCKED_NOTE),
        }
    }

    /// Ignored when the selector is disabled.
    pub fn set_role(&mut self, role: UserRole) -> bool {
        if self.role_editable() {
            self.form.role = role;
        }
        self.role_editable()
    }

    /// Ignored when the toggle is disabled.
    pub fn set_active(&mut self, active: bool) -> bool {
        if self.active_editable() {
            self.form.is_active = active;
        }
        self.active_editable()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Set by a successful save; the page stays open.
    pub fn saved(&self) -> bool {
        self.saved
    }

    pub fn reset_sent(&self) -> bool {
        self.reset_sent
    }

    pub fn is_saving(&self) -> bool {
        self.saving.is_pending()
    }

    fn changes(&self, form: EditUserForm) -> UpdateUserDto {
        UpdateUserDto {
            full_name: Some(form.full_name),
            phone_number: Some(form.phone_number),
            role: self.role_editable().then_some(form.role),
            is_active: self.active_editable().then_some(form.is_active),
        }
    }

    pub async fn submit(&mut self) -> SubmitOutcome {
        let Some(_guard) = self.saving.try_begin() else {
            return SubmitOutcome::Busy;
        };
        self.saved = false;
        let result = self.save().await;
        let outcome = match result {
            Ok(user) => {
                self.form = EditUserForm::from(&user);
                self.user = Some(user);
                self.saved = true;
                SubmitOutcome::Saved
            }
            Err(err) => SubmitOutcome::from_error(&err),
        };
        self.error = outcome.error_message().map(str::to_string);
        outcome
    }

    async fn save(&self) -> AdminResult<User> {
        let Some(user) = &self.user else {
            return Err(AdminError::Validation("User is not loaded".to_string()));
        };
        let form = self.form.trimmed();
        validate_form(&form, &EDIT_ORDER)?;
        let row = self
            .auth
            .data()
            .update(Resource::Users, &user.id, &self.changes(form))
            .await?
            .data;
        info!(user_id = %user.id, "User updated");
        Ok(serde_json::from_value(row)?)
    }

    /// Email the user a recovery link.
    pub async fn send_password_reset(&mut self) -> SubmitOutcome {
        let Some(_guard) = self.resetting.try_begin() else {
            return SubmitOutcome::Busy;
        };
        let Some(email) = self.user.as_ref().map(|u| u.email.clone()) else {
            return SubmitOutcome::Invalid("User is not loaded".to_string());
        };
        match self.auth.send_password_reset(&email, &self.reset_redirect).await {
            Ok(()) => {
                self.reset_sent = true;
                SubmitOutcome::Saved
            }
            Err(err) => {
                let outcome = SubmitOutcome::from_error(&err);
                self.error = outcome.error_message().map(str::to_string);
                outcome
            }
        }
    }
}
