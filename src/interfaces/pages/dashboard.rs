//! Dashboard metrics

use rust_decimal::Decimal;
use tracing::warn;

use crate::application::{DataProvider, Resource};
use crate::domain::{
    EnrollmentStats, Filter, Identity, ListParams, ReportView, RevenueSummary, UserRole,
    UserStats,
};
use crate::interfaces::display::format_kes;
use crate::shared::AdminResult;

pub const SUBTITLE: &str = "Here's what's happening with your academy today.";

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardMetrics {
    /// Active students plus active tutors.
    pub active_users: i64,
    pub published_courses: u64,
    pub active_enrollments: u64,
    pub total_revenue: Decimal,
    /// Completed payments per day and method, newest day first.
    pub revenue: Vec<RevenueSummary>,
    pub enrollments: Vec<EnrollmentStats>,
}

impl DashboardMetrics {
    fn from_reports(
        users: &[UserStats],
        revenue: Vec<RevenueSummary>,
        enrollments: Vec<EnrollmentStats>,
        published_courses: u64,
        active_enrollments: u64,
    ) -> Self {
        let active_users = users
            .iter()
            .filter(|s| matches!(s.role, Some(UserRole::Student) | Some(UserRole::Tutor)))
            .filter_map(|s| s.active_users)
            .sum();
        let total_revenue = revenue.iter().filter_map(|r| r.total_revenue).sum();
        Self {
            active_users,
            published_courses,
            active_enrollments,
            total_revenue,
            revenue,
            enrollments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricCard {
    pub title: &'static str,
    pub value: String,
    pub description: &'static str,
    pub icon: &'static str,
}

#[derive(Default)]
pub struct DashboardPage {
    metrics: Option<DashboardMetrics>,
    error: Option<String>,
}

impl DashboardPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// All five reads run concurrently; any failure leaves the cards blank.
    pub async fn load(&mut self, data: &DataProvider) -> AdminResult<()> {
        let published = ListParams::new().filter(Filter::eq("is_published", true));
        let active = ListParams::new().filter(Filter::eq("access_granted", true));

        let result = futures_util::try_join!(
            data.report::<UserStats>(ReportView::UserStats),
            data.report::<RevenueSummary>(ReportView::RevenueSummary),
            data.report::<EnrollmentStats>(ReportView::EnrollmentStats),
            data.count(Resource::Courses, published),
            data.count(Resource::Enrollments, active),
        );

        match result {
            Ok((users, revenue, enrollments, courses, active)) => {
                self.metrics = Some(DashboardMetrics::from_reports(
                    &users,
                    revenue,
                    enrollments,
                    courses,
                    active,
                ));
                self.error = None;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Dashboard metrics unavailable");
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn metrics(&self) -> Option<&DashboardMetrics> {
        self.metrics.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn welcome(identity: Option<&Identity>) -> String {
        match identity.map(|i| i.first_name()).filter(|n| !n.is_empty()) {
            Some(name) => format!("Welcome back, {}", name),
            None => "Welcome back".to_string(),
        }
    }

    pub fn cards(&self) -> [MetricCard; 4] {
        let m = self.metrics.as_ref();
        let count = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
        [
            MetricCard {
                title: "Total Users",
                value: count(m.map(|m| m.active_users.to_string())),
                description: "Active students & tutors",
                icon: "users",
            },
            MetricCard {
                title: "Courses",
                value: count(m.map(|m| m.published_courses.to_string())),
                description: "Published courses",
                icon: "book-open",
            },
            MetricCard {
                title: "Enrollments",
                value: count(m.map(|m| m.active_enrollments.to_string())),
                description: "Active enrollments",
                icon: "clipboard-list",
            },
            MetricCard {
                title: "Revenue",
                value: m
                    .map(|m| format_kes(m.total_revenue))
                    .unwrap_or_else(|| "KES -".to_string()),
                description: "Total revenue",
                icon: "credit-card",
            },
        ]
    }
}
