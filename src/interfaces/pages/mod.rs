//! Page controllers: the state and actions behind each screen.
//!
//! Controllers are plain structs with async `&mut self` actions. A front
//! end renders their state and forwards user input; nothing here draws.

pub mod access_denied;
pub mod course_phases;
pub mod courses;
pub mod dashboard;
pub mod enrollments;
pub mod form;
pub mod list;
pub mod login;
pub mod payments;
pub mod reset_password;
pub mod users;

pub use access_denied::AccessDeniedPage;
pub use course_phases::{PhaseDialog, PhaseForm, PhasesSection};
pub use courses::{CourseFilters, CourseForm, CourseFormPage, CourseShowPage};
pub use dashboard::{DashboardMetrics, DashboardPage, MetricCard};
pub use enrollments::{EnrollmentFilters, EnrollmentForm, EnrollmentFormPage, SelectOption};
pub use form::{Choice, PendingFlag, SubmitOutcome};
pub use list::{ListController, ListQuery};
pub use login::{LoginForm, LoginPage};
pub use payments::{PaymentFilters, PaymentShowPage};
pub use reset_password::{ResetPasswordForm, ResetPasswordPage};
pub use users::{CreateUserForm, CreateUserPage, EditUserForm, EditUserPage, UserFilters};

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use crate::application::{AuthProvider, DataProvider};
    use crate::domain::{AuthGateway, UserRole};
    use crate::infrastructure::{InMemoryAuth, InMemoryRowStore};

    pub(crate) const PASSWORD: &str = "secret123";

    pub(crate) struct Fixture {
        pub rows: Arc<InMemoryRowStore>,
        pub gateway: Arc<InMemoryAuth>,
        pub auth: AuthProvider,
        pub user_id: String,
    }

    impl Fixture {
        pub fn data(&self) -> DataProvider {
            self.auth.data().clone()
        }
    }

    pub(crate) async fn signed_out() -> Fixture {
        let rows = Arc::new(InMemoryRowStore::new());
        let gateway = Arc::new(InMemoryAuth::new(rows.clone()));
        let auth = AuthProvider::new(gateway.clone(), DataProvider::new(rows.clone()));
        let user_id = gateway
            .seed_account("grace@tecmarsign.test", PASSWORD, "Grace Wanjiru", UserRole::Admin)
            .await
            .unwrap();
        Fixture {
            rows,
            gateway,
            auth,
            user_id,
        }
    }

    pub(crate) async fn signed_in(role: UserRole) -> Fixture {
        let mut fx = signed_out().await;
        let email = format!("{}@tecmarsign.test", role.as_str());
        fx.user_id = fx
            .gateway
            .seed_account(&email, PASSWORD, "Staff Member", role)
            .await
            .unwrap();
        fx.gateway.sign_in_with_password(&email, PASSWORD).await.unwrap();
        fx
    }

    pub(crate) async fn admin() -> Fixture {
        signed_in(UserRole::Admin).await
    }

    pub(crate) async fn tutor() -> Fixture {
        signed_in(UserRole::Tutor).await
    }
}
