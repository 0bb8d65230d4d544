//! Auth adapter: login / logout / check / identity / permissions
//!
//! Identity and role come from the `users` profile row of the session's
//! user. A missing profile means [`UserRole::Student`].

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use super::data_provider::DataProvider;
use super::resources::Resource;
use crate::domain::{
    AuthGateway, AuthUser, CreateUserDto, Credentials, Filter, Identity, ListParams, Session,
    UserRole,
};
use crate::notifications::AuthEventSubscriber;
use crate::shared::{AdminError, AdminResult};

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub success: bool,
    pub redirect_to: Option<String>,
    pub error: Option<String>,
}

impl AuthOutcome {
    fn ok(redirect_to: &str) -> Self {
        Self {
            success: true,
            redirect_to: Some(redirect_to.to_string()),
            error: None,
        }
    }

    fn failed(error: &AdminError) -> Self {
        Self {
            success: false,
            redirect_to: None,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub authenticated: bool,
    pub redirect_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorOutcome {
    pub logout: bool,
    pub redirect_to: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    role: Option<UserRole>,
}

#[derive(Clone)]
pub struct AuthProvider {
    gateway: Arc<dyn AuthGateway>,
    data: DataProvider,
}

impl AuthProvider {
    pub fn new(gateway: Arc<dyn AuthGateway>, data: DataProvider) -> Self {
        Self { gateway, data }
    }

    pub fn data(&self) -> &DataProvider {
        &self.data
    }

    pub async fn login(&self, credentials: &Credentials) -> AuthOutcome {
        match self
            .gateway
            .sign_in_with_password(&credentials.email, &credentials.password)
            .await
        {
            Ok(session) => {
                info!(user_id = %session.user.id, "Login succeeded");
                AuthOutcome::ok(HOME_PATH)
            }
            Err(err) => {
                warn!(error = %err, "Login failed");
                AuthOutcome::failed(&err)
            }
        }
    }

    pub async fn logout(&self) -> AuthOutcome {
        match self.gateway.sign_out().await {
            Ok(()) => AuthOutcome::ok(LOGIN_PATH),
            Err(err) => AuthOutcome::failed(&err),
        }
    }

    /// Authenticated while a (possibly refreshed) session exists.
    pub async fn check(&self) -> CheckOutcome {
        match self.gateway.session().await {
            Ok(Some(_)) => CheckOutcome {
                authenticated: true,
                redirect_to: None,
            },
            Ok(None) => CheckOutcome {
                authenticated: false,
                redirect_to: Some(LOGIN_PATH.to_string()),
            },
            Err(err) => {
                warn!(error = %err, "Session check failed");
                CheckOutcome {
                    authenticated: false,
                    redirect_to: Some(LOGIN_PATH.to_string()),
                }
            }
        }
    }

    async fn profile(&self, user: &AuthUser) -> AdminResult<Option<ProfileRow>> {
        let params = ListParams::new()
            .filter(Filter::eq("id", user.id.as_str()))
            .select("full_name,email,role");
        let rows = self.data.list::<ProfileRow>(Resource::Users, &params).await?;
        Ok(rows.data.into_iter().next())
    }

    /// Display identity; name falls back to the account email.
    pub async fn get_identity(&self) -> AdminResult<Option<Identity>> {
        let Some(user) = self.gateway.current_user().await? else {
            return Ok(None);
        };
        let profile = self.profile(&user).await?;

        let (full_name, role) = match profile {
            Some(p) => (p.full_name, p.role.unwrap_or_default()),
            None => (None, UserRole::default()),
        };
        let name = full_name
            .filter(|n| !n.trim().is_empty())
            .or_else(|| user.email.clone())
            .unwrap_or_default();

        Ok(Some(Identity {
            id: user.id,
            name,
            email: user.email,
            role,
        }))
    }

    /// Role of the signed-in user; `None` when signed out.
    pub async fn get_permissions(&self) -> AdminResult<Option<UserRole>> {
        let Some(user) = self.gateway.current_user().await? else {
            return Ok(None);
        };
        let role = self
            .profile(&user)
            .await?
            .and_then(|p| p.role)
            .unwrap_or_default();
        Ok(Some(role))
    }

    /// 401/403 force a logout and a trip to the login page.
    pub fn on_error(&self, error: &AdminError) -> ErrorOutcome {
        if error.is_authorization_failure() {
            ErrorOutcome {
                logout: true,
                redirect_to: Some(LOGIN_PATH.to_string()),
            }
        } else {
            ErrorOutcome {
                logout: false,
                redirect_to: None,
            }
        }
    }

    // ── Session boundary pass-throughs used by individual pages ──

    pub async fn session(&self) -> AdminResult<Option<Session>> {
        self.gateway.session().await
    }

    pub async fn sign_up(&self, request: &CreateUserDto) -> AdminResult<AuthUser> {
        self.gateway.sign_up(request).await
    }

    pub async fn update_password(&self, new_password: &str) -> AdminResult<()> {
        self.gateway.update_password(new_password).await
    }

    pub async fn send_password_reset(&self, email: &str, redirect_to: &str) -> AdminResult<()> {
        self.gateway.reset_password_for_email(email, redirect_to).await
    }

    pub async fn restore_from_redirect(&self, redirect_url: &str) -> AdminResult<Session> {
        self.gateway.restore_from_redirect(redirect_url).await
    }

    pub fn subscribe(&self) -> AuthEventSubscriber {
        self.gateway.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RowStore;
    use crate::infrastructure::{InMemoryAuth, InMemoryRowStore};
    use serde_json::json;

    async fn setup() -> (Arc<InMemoryRowStore>, Arc<InMemoryAuth>, AuthProvider) {
        let rows = Arc::new(InMemoryRowStore::new());
        let auth = Arc::new(InMemoryAuth::new(rows.clone()));
        auth.seed_account("admin@tecmarsign.com", "admin123", "Grace Wambui", UserRole::Admin)
            .await
            .unwrap();
        let provider = AuthProvider::new(auth.clone(), DataProvider::new(rows.clone()));
        (rows, auth, provider)
    }

    fn creds(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn login_redirects_home() {
        let (_, _, provider) = setup().await;
        let outcome = provider.login(&creds("admin@tecmarsign.com", "admin123")).await;
        assert!(outcome.success);
        assert_eq!(outcome.redirect_to.as_deref(), Some("/"));
        assert!(provider.check().await.authenticated);
    }

    #[tokio::test]
    async fn failed_login_carries_backend_message() {
        let (_, _, provider) = setup().await;
        let outcome = provider.login(&creds("admin@tecmarsign.com", "bad-pass")).await;
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("Invalid login credentials"));
    }

    #[tokio::test]
    async fn signed_out_check_redirects_to_login() {
        let (_, _, provider) = setup().await;
        let check = provider.check().await;
        assert!(!check.authenticated);
        assert_eq!(check.redirect_to.as_deref(), Some("/login"));
        assert_eq!(provider.get_identity().await.unwrap(), None);
        assert_eq!(provider.get_permissions().await.unwrap(), None);
    }

    #[tokio::test]
    async fn identity_comes_from_profile() {
        let (_, _, provider) = setup().await;
        provider.login(&creds("admin@tecmarsign.com", "admin123")).await;

        let identity = provider.get_identity().await.unwrap().unwrap();
        assert_eq!(identity.name, "Grace Wambui");
        assert_eq!(identity.first_name(), "Grace");
        assert_eq!(identity.role, UserRole::Admin);
        assert_eq!(provider.get_permissions().await.unwrap(), Some(UserRole::Admin));
    }

    #[tokio::test]
    async fn missing_profile_defaults_to_student() {
        let (rows, _, provider) = setup().await;
        provider.login(&creds("admin@tecmarsign.com", "admin123")).await;
        let id = provider.session().await.unwrap().unwrap().user.id;
        rows.delete("users", &id).await.unwrap();

        let identity = provider.get_identity().await.unwrap().unwrap();
        assert_eq!(identity.name, "admin@tecmarsign.com");
        assert_eq!(identity.role, UserRole::Student);
        assert_eq!(provider.get_permissions().await.unwrap(), Some(UserRole::Student));
    }

    #[tokio::test]
    async fn blank_full_name_falls_back_to_email() {
        let (rows, _, provider) = setup().await;
        provider.login(&creds("admin@tecmarsign.com", "admin123")).await;
        let id = provider.session().await.unwrap().unwrap().user.id;
        rows.update("users", &id, json!({ "full_name": "" })).await.unwrap();

        let identity = provider.get_identity().await.unwrap().unwrap();
        assert_eq!(identity.name, "admin@tecmarsign.com");
    }

    #[tokio::test]
    async fn logout_redirects_to_login() {
        let (_, _, provider) = setup().await;
        provider.login(&creds("admin@tecmarsign.com", "admin123")).await;
        let outcome = provider.logout().await;
        assert!(outcome.success);
        assert_eq!(outcome.redirect_to.as_deref(), Some("/login"));
        assert!(!provider.check().await.authenticated);
    }

    #[test]
    fn only_authorization_failures_force_logout() {
        let rows = Arc::new(InMemoryRowStore::new());
        let provider = AuthProvider::new(
            Arc::new(InMemoryAuth::new(rows.clone())),
            DataProvider::new(rows),
        );

        let forced = provider.on_error(&AdminError::remote(Some(401), "JWT expired"));
        assert!(forced.logout);
        assert_eq!(forced.redirect_to.as_deref(), Some("/login"));

        let kept = provider.on_error(&AdminError::remote(Some(500), "boom"));
        assert!(!kept.logout);
        assert!(kept.redirect_to.is_none());
    }
}
