//! Enrollments: list with names embedded, create / edit form

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::form::{Choice, PendingFlag, SubmitOutcome};
use super::list::ListQuery;
use crate::application::{DataProvider, Resource};
use crate::domain::{
    Enrollment, EnrollmentValues, Filter, ListParams, PaymentStatus, Sorter,
};
use crate::shared::{validate_form, AdminResult};

pub const LIST_SELECT: &str = "*,users(full_name),courses(title),course_phases(phase_name)";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrollmentFilters {
    pub payment_status: Choice<PaymentStatus>,
    /// `true` = access granted.
    pub access: Choice<bool>,
}

impl EnrollmentFilters {
    pub fn parse_access(value: &str) -> Option<bool> {
        match value {
            "granted" | "true" => Some(true),
            "revoked" | "false" => Some(false),
            _ => None,
        }
    }
}

impl ListQuery for EnrollmentFilters {
    type Row = Enrollment;
    const RESOURCE: Resource = Resource::Enrollments;

    fn filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(status) = self.payment_status.selected() {
            filters.push(Filter::eq("payment_status", status.as_str()));
        }
        if let Some(access) = self.access.selected() {
            filters.push(Filter::eq("access_granted", *access));
        }
        filters
    }

    fn sorters(&self) -> Vec<Sorter> {
        vec![Sorter::desc("enrollment_date"), Sorter::desc("created_at")]
    }

    fn select(&self) -> Option<String> {
        Some(LIST_SELECT.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct EnrollmentForm {
    #[validate(length(min = 1, message = "Student is required"))]
    pub student_id: String,
    #[validate(length(min = 1, message = "Course is required"))]
    pub course_id: String,
    #[validate(length(min = 1, message = "Phase is required"))]
    pub phase_id: String,
    pub payment_status: PaymentStatus,
    pub access_granted: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

const ORDER: [&str; 3] = ["student_id", "course_id", "phase_id"];

impl EnrollmentForm {
    fn values(&self) -> EnrollmentValues {
        EnrollmentValues {
            student_id: self.student_id.clone(),
            course_id: self.course_id.clone(),
            phase_id: self.phase_id.clone(),
            payment_status: self.payment_status,
            access_granted: self.access_granted,
            expires_at: self.expires_at,
        }
    }
}

impl From<&Enrollment> for EnrollmentForm {
    fn from(e: &Enrollment) -> Self {
        Self {
            student_id: e.student_id.clone(),
            course_id: e.course_id.clone(),
            phase_id: e.phase_id.clone(),
            payment_status: e.payment_status,
            access_granted: e.has_access(),
            expires_at: e.expires_at,
        }
    }
}

/// Entry of a select box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

#[derive(Deserialize)]
struct OptionRow {
    id: String,
    #[serde(alias = "full_name", alias = "title", alias = "phase_name")]
    label: Option<String>,
}

impl From<OptionRow> for SelectOption {
    fn from(row: OptionRow) -> Self {
        let label = row.label.unwrap_or_else(|| row.id.clone());
        Self {
            value: row.id,
            label,
        }
    }
}

async fn options(
    data: &DataProvider,
    resource: Resource,
    params: ListParams,
) -> AdminResult<Vec<SelectOption>> {
    let rows = data.list::<OptionRow>(resource, &params).await?;
    Ok(rows.data.into_iter().map(SelectOption::from).collect())
}

pub struct EnrollmentFormPage {
    data: DataProvider,
    id: Option<String>,
    form: EnrollmentForm,
    students: Vec<SelectOption>,
    courses: Vec<SelectOption>,
    phases: Vec<SelectOption>,
    saving: PendingFlag,
    error: Option<String>,
}

impl EnrollmentFormPage {
    pub async fn create(data: DataProvider) -> AdminResult<Self> {
        let mut page = Self {
            data,
            id: None,
            form: EnrollmentForm::default(),
            students: Vec::new(),
            courses: Vec::new(),
            phases: Vec::new(),
            saving: PendingFlag::new(),
            error: None,
        };
        page.load_options().await?;
        Ok(page)
    }

    pub async fn edit(data: DataProvider, id: &str) -> AdminResult<Self> {
        let enrollment: Enrollment = data.one(Resource::Enrollments, id).await?;
        let mut page = Self::create(data).await?;
        page.form = EnrollmentForm::from(&enrollment);
        page.id = Some(enrollment.id);
        page.load_phases().await?;
        Ok(page)
    }

    async fn load_options(&mut self) -> AdminResult<()> {
        let students = ListParams::new()
            .filter(Filter::eq("role", "student"))
            .sort(Sorter::asc("full_name"))
            .select("id,full_name");
        let courses = ListParams::new().sort(Sorter::asc("title")).select("id,title");
        self.students = options(&self.data, Resource::Users, students).await?;
        self.courses = options(&self.data, Resource::Courses, courses).await?;
        Ok(())
    }

    async fn load_phases(&mut self) -> AdminResult<()> {
        if self.form.course_id.is_empty() {
            self.phases.clear();
            return Ok(());
        }
        let params = ListParams::new()
            .filter(Filter::eq("course_id", self.form.course_id.as_str()))
            .sort(Sorter::asc("phase_number"))
            .select("id,phase_name");
        self.phases = options(&self.data, Resource::CoursePhases, params).await?;
        Ok(())
    }

    pub fn is_edit(&self) -> bool {
        self.id.is_some()
    }

    pub fn form(&self) -> &EnrollmentForm {
        &self.form
    }

    pub fn students(&self) -> &[SelectOption] {
        &self.students
    }

    pub fn courses(&self) -> &[SelectOption] {
        &self.courses
    }

    /// Phases of the selected course.
    pub fn phases(&self) -> &[SelectOption] {
        &self.phases
    }

    pub fn set_student(&mut self, id: impl Into<String>) {
        self.form.student_id = id.into();
    }

    /// A new course clears the phase and reloads the phase options.
    pub async fn set_course(&mut self, id: impl Into<String>) -> AdminResult<()> {
        let id = id.into();
        if id != self.form.course_id {
            self.form.course_id = id;
            self.form.phase_id.clear();
        }
        self.load_phases().await
    }

    pub fn set_phase(&mut self, id: impl Into<String>) {
        self.form.phase_id = id.into();
    }

    pub fn set_payment_status(&mut self, status: PaymentStatus) {
        self.form.payment_status = status;
    }

    pub fn set_access_granted(&mut self, granted: bool) {
        self.form.access_granted = granted;
    }

    pub fn set_expires_at(&mut self, at: Option<DateTime<Utc>>) {
        self.form.expires_at = at;
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
        let outcome = match self.save().await {
            Ok(()) => SubmitOutcome::Navigate(Resource::Enrollments.list_path()),
            Err(err) => SubmitOutcome::from_error(&err),
        };
        self.error = outcome.error_message().map(str::to_string);
        outcome
    }

    async fn save(&self) -> AdminResult<()> {
        validate_form(&self.form, &ORDER)?;
        let values = self.form.values();
        match &self.id {
            Some(id) => {
                self.data.update(Resource::Enrollments, id, &values).await?;
            }
            None => {
                self.data.create(Resource::Enrollments, &values).await?;
            }
        }
        info!(
            student_id = %values.student_id,
            phase_id = %values.phase_id,
            access = values.access_granted,
            "Enrollment saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;
    use crate::interfaces::pages::fixtures;
    use crate::interfaces::pages::list::ListController;
    use serde_json::json;

    struct Seed {
        student: String,
        course: String,
        phases: Vec<String>,
        other_course: String,
    }

    async fn seed(fx: &fixtures::Fixture) -> Seed {
        let student = fx
            .gateway
            .seed_account("wanjiku@tecmarsign.test", "secret123", "Wanjiku Kamau", UserRole::Student)
            .await
            .unwrap();
        let data = fx.data();
        let course = data
            .create(Resource::Courses, &json!({ "title": "Web Development" }))
            .await
            .unwrap()
            .data["id"]
            .as_str()
            .unwrap()
            .to_string();
        let other_course = data
            .create(Resource::Courses, &json!({ "title": "Digital Marketing" }))
            .await
            .unwrap()
            .data["id"]
            .as_str()
            .unwrap()
            .to_string();
        let mut phases = Vec::new();
        for (n, name) in [(1, "Fundamentals"), (2, "Advanced")] {
            let phase = data
                .create(
                    Resource::CoursePhases,
                    &json!({
                        "course_id": course, "phase_number": n, "phase_name": name,
                        "duration_weeks": 4, "price": 15000
                    }),
                )
                .await
                .unwrap();
            phases.push(phase.data["id"].as_str().unwrap().to_string());
        }
        Seed {
            student,
            course,
            phases,
            other_course,
        }
    }

    #[tokio::test]
    async fn form_requires_every_reference() {
        let fx = fixtures::admin().await;
        let seed = seed(&fx).await;
        let mut page = EnrollmentFormPage::create(fx.data()).await.unwrap();
        assert_eq!(page.students().len(), 1);
        assert_eq!(page.students()[0].label, "Wanjiku Kamau");

        page.set_student(seed.student.clone());
        assert_eq!(
            page.submit().await,
            SubmitOutcome::Invalid("Course is required".into())
        );
        assert!(fx.rows.rows("enrollments").unwrap().is_empty());
    }

    #[tokio::test]
    async fn changing_course_clears_phase() {
        let fx = fixtures::admin().await;
        let seed = seed(&fx).await;
        let mut page = EnrollmentFormPage::create(fx.data()).await.unwrap();

        page.set_course(seed.course.clone()).await.unwrap();
        assert_eq!(page.phases().len(), 2);
        page.set_phase(seed.phases[0].clone());

        page.set_course(seed.other_course.clone()).await.unwrap();
        assert!(page.form().phase_id.is_empty());
        assert!(page.phases().is_empty());
    }

    #[tokio::test]
    async fn create_then_list_shows_names() {
        let fx = fixtures::admin().await;
        let seed = seed(&fx).await;
        let mut page = EnrollmentFormPage::create(fx.data()).await.unwrap();
        page.set_student(seed.student.clone());
        page.set_course(seed.course.clone()).await.unwrap();
        page.set_phase(seed.phases[1].clone());
        page.set_payment_status(PaymentStatus::Paid);
        page.set_access_granted(true);
        assert_eq!(
            page.submit().await,
            SubmitOutcome::Navigate("/enrollments".into())
        );

        let mut list: ListController<EnrollmentFilters> = ListController::new(fx.data());
        list.fetch().await.unwrap();
        assert_eq!(list.total(), 1);
        let row = &list.rows()[0];
        assert_eq!(row.student_name(), "Wanjiku Kamau");
        assert_eq!(row.course_title(), "Web Development");
        assert_eq!(row.phase_name(), "Advanced");

        list.update_query(|q| q.payment_status = Choice::Only(PaymentStatus::Pending))
            .await
            .unwrap();
        assert_eq!(list.total(), 0);
        list.clear_filters().await.unwrap();
        assert_eq!(list.total(), 1);
    }

    #[tokio::test]
    async fn edit_revokes_access() {
        let fx = fixtures::admin().await;
        let seed = seed(&fx).await;
        let created = fx
            .data()
            .create(
                Resource::Enrollments,
                &json!({
                    "student_id": seed.student, "course_id": seed.course,
                    "phase_id": seed.phases[0], "access_granted": true
                }),
            )
            .await
            .unwrap();
        let id = created.data["id"].as_str().unwrap().to_string();

        let mut page = EnrollmentFormPage::edit(fx.data(), &id).await.unwrap();
        assert!(page.is_edit());
        assert_eq!(page.phases().len(), 2);
        assert!(page.form().access_granted);
        page.set_access_granted(false);
        assert_eq!(
            page.submit().await,
            SubmitOutcome::Navigate("/enrollments".into())
        );

        let stored: Enrollment = fx.data().one(Resource::Enrollments, &id).await.unwrap();
        assert!(!stored.has_access());
    }
}
