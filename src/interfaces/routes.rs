//! Route table and the guard in front of the protected routes

use tracing::debug;

use crate::application::{AuthProvider, LOGIN_PATH};
use crate::domain::UserRole;

pub const ACCESS_DENIED_PATH: &str = "/access-denied";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    ResetPassword,
    AccessDenied,
    Dashboard,
    Users,
    UserCreate,
    UserEdit(String),
    Courses,
    CourseCreate,
    CourseEdit(String),
    CourseShow(String),
    Enrollments,
    EnrollmentCreate,
    EnrollmentEdit(String),
    Payments,
    PaymentShow(String),
    NotFound(String),
}

impl Route {
    /// Resolve a path; query string and fragment are ignored.
    pub fn parse(path: &str) -> Self {
        let clean = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');
        let segments: Vec<&str> = clean.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Self::Dashboard,
            ["login"] => Self::Login,
            ["reset-password"] => Self::ResetPassword,
            ["access-denied"] => Self::AccessDenied,
            ["users"] => Self::Users,
            ["users", "create"] => Self::UserCreate,
            ["users", "edit", id] => Self::UserEdit(id.to_string()),
            ["courses"] => Self::Courses,
            ["courses", "create"] => Self::CourseCreate,
            ["courses", "edit", id] => Self::CourseEdit(id.to_string()),
            ["courses", "show", id] => Self::CourseShow(id.to_string()),
            ["enrollments"] => Self::Enrollments,
            ["enrollments", "create"] => Self::EnrollmentCreate,
            ["enrollments", "edit", id] => Self::EnrollmentEdit(id.to_string()),
            ["payments"] => Self::Payments,
            ["payments", "show", id] => Self::PaymentShow(id.to_string()),
            _ => Self::NotFound(path.to_string()),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Login => LOGIN_PATH.to_string(),
            Self::ResetPassword => "/reset-password".to_string(),
            Self::AccessDenied => ACCESS_DENIED_PATH.to_string(),
            Self::Dashboard => "/".to_string(),
            Self::Users => "/users".to_string(),
            Self::UserCreate => "/users/create".to_string(),
            Self::UserEdit(id) => format!("/users/edit/{}", id),
            Self::Courses => "/courses".to_string(),
            Self::CourseCreate => "/courses/create".to_string(),
            Self::CourseEdit(id) => format!("/courses/edit/{}", id),
            Self::CourseShow(id) => format!("/courses/show/{}", id),
            Self::Enrollments => "/enrollments".to_string(),
            Self::EnrollmentCreate => "/enrollments/create".to_string(),
            Self::EnrollmentEdit(id) => format!("/enrollments/edit/{}", id),
            Self::Payments => "/payments".to_string(),
            Self::PaymentShow(id) => format!("/payments/show/{}", id),
            Self::NotFound(path) => path.clone(),
        }
    }

    /// Reachable without a session.
    pub fn is_public(&self) -> bool {
        matches!(
            self,
            Self::Login | Self::ResetPassword | Self::AccessDenied | Self::NotFound(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Render(Route),
    Redirect(String),
}

/// Session and role check in front of every protected route.
#[derive(Clone)]
pub struct RouteGuard {
    auth: AuthProvider,
}

impl RouteGuard {
    pub fn new(auth: AuthProvider) -> Self {
        Self { auth }
    }

    pub async fn resolve(&self, path: &str) -> GuardDecision {
        let route = Route::parse(path);
        if route.is_public() {
            return GuardDecision::Render(route);
        }

        let check = self.auth.check().await;
        if !check.authenticated {
            debug!(path, "No session, redirecting to login");
            return GuardDecision::Redirect(
                check.redirect_to.unwrap_or_else(|| LOGIN_PATH.to_string()),
            );
        }

        // Students hold accounts but not console access
        let role = match self.auth.get_permissions().await {
            Ok(role) => role.unwrap_or_default(),
            Err(err) => {
                let outcome = self.auth.on_error(&err);
                if outcome.logout {
                    return GuardDecision::Redirect(
                        outcome.redirect_to.unwrap_or_else(|| LOGIN_PATH.to_string()),
                    );
                }
                UserRole::default()
            }
        };
        if !role.is_staff() {
            debug!(path, role = %role, "Role not allowed, redirecting");
            return GuardDecision::Redirect(ACCESS_DENIED_PATH.to_string());
        }

        GuardDecision::Render(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::application::DataProvider;
    use crate::domain::Credentials;
    use crate::infrastructure::{InMemoryAuth, InMemoryRowStore};

    #[test]
    fn parse_and_path_agree() {
        let paths = [
            "/",
            "/login",
            "/reset-password",
            "/access-denied",
            "/users",
            "/users/create",
            "/users/edit/u1",
            "/courses",
            "/courses/create",
            "/courses/edit/c1",
            "/courses/show/c1",
            "/enrollments",
            "/enrollments/create",
            "/enrollments/edit/e1",
            "/payments",
            "/payments/show/p1",
        ];
        for path in paths {
            let route = Route::parse(path);
            assert!(!matches!(route, Route::NotFound(_)), "{}", path);
            assert_eq!(route.path(), path);
        }
    }

    #[test]
    fn unknown_paths_are_not_found() {
        assert_eq!(
            Route::parse("/tariffs"),
            Route::NotFound("/tariffs".to_string())
        );
        assert_eq!(Route::parse("/users/"), Route::Users);
        assert_eq!(Route::parse("/users?page=2"), Route::Users);
        assert!(matches!(Route::parse("/payments/create"), Route::NotFound(_)));
    }

    async fn guard_with(role: Option<UserRole>) -> RouteGuard {
        let rows = Arc::new(InMemoryRowStore::new());
        let auth = Arc::new(InMemoryAuth::new(rows.clone()));
        let provider = AuthProvider::new(auth.clone(), DataProvider::new(rows));
        if let Some(role) = role {
            auth.seed_account("someone@tecmarsign.com", "secret1", "Some One", role)
                .await
                .unwrap();
            let outcome = provider
                .login(&Credentials {
                    email: "someone@tecmarsign.com".into(),
                    password: "secret1".into(),
                })
                .await;
            assert!(outcome.success);
        }
        RouteGuard::new(provider)
    }

    #[tokio::test]
    async fn anonymous_visitor_is_sent_to_login() {
        let guard = guard_with(None).await;
        assert_eq!(
            guard.resolve("/users").await,
            GuardDecision::Redirect("/login".to_string())
        );
        assert_eq!(
            guard.resolve("/reset-password").await,
            GuardDecision::Render(Route::ResetPassword)
        );
    }

    #[tokio::test]
    async fn staff_pass_and_students_are_denied() {
        let tutor = guard_with(Some(UserRole::Tutor)).await;
        assert_eq!(tutor.resolve("/users").await, GuardDecision::Render(Route::Users));

        let admin = guard_with(Some(UserRole::Admin)).await;
        assert_eq!(
            admin.resolve("/courses/show/c9").await,
            GuardDecision::Render(Route::CourseShow("c9".into()))
        );

        let student = guard_with(Some(UserRole::Student)).await;
        assert_eq!(
            student.resolve("/").await,
            GuardDecision::Redirect("/access-denied".to_string())
        );
    }
}
