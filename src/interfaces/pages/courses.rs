//! Courses: list, create / edit form and the show page

use tracing::info;
use url::Url;
use validator::Validate;

use super::course_phases::PhasesSection;
use super::form::{non_blank, Choice, PendingFlag, SubmitOutcome};
use super::list::ListQuery;
use crate::application::{DataProvider, Resource};
use crate::domain::{Course, CourseCategory, CourseValues, Filter};
use crate::shared::{validate_form, AdminError, AdminResult};

pub const TITLE_MAX: usize = 100;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseFilters {
    pub title: String,
    pub category: Choice<CourseCategory>,
    /// `true` = published.
    pub published: Choice<bool>,
}

impl CourseFilters {
    pub fn parse_published(value: &str) -> Option<bool> {
        match value {
            "published" | "true" => Some(true),
            "draft" | "false" => Some(false),
            _ => None,
        }
    }
}

impl ListQuery for CourseFilters {
    type Row = Course;
    const RESOURCE: Resource = Resource::Courses;

    fn filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(title) = non_blank(&self.title) {
            filters.push(Filter::contains("title", title));
        }
        if let Some(category) = self.category.selected() {
            filters.push(Filter::eq("category", category.as_str()));
        }
        if let Some(published) = self.published.selected() {
            filters.push(Filter::eq("is_published", *published));
        }
        filters
    }
}

#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct CourseForm {
    #[validate(length(min = 3, message = "Title must be at least 3 characters"))]
    pub title: String,
    #[validate(length(max = 500, message = "Description must be less than 500 characters"))]
    pub description: String,
    pub category: CourseCategory,
    /// Empty or an absolute URL.
    pub thumbnail_url: String,
    pub is_published: bool,
}

const ORDER: [&str; 2] = ["title", "description"];

impl CourseForm {
    /// Text fields as they will be stored.
    fn trimmed(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            thumbnail_url: self.thumbnail_url.trim().to_string(),
            ..self.clone()
        }
    }

    /// First violated rule, in field order, judged on the trimmed values.
    pub fn check(&self) -> AdminResult<()> {
        self.trimmed().check_trimmed()
    }

    fn check_trimmed(&self) -> AdminResult<()> {
        if self.title.chars().count() > TITLE_MAX {
            return Err(AdminError::Validation(
                "Title must be less than 100 characters".to_string(),
            ));
        }
        validate_form(self, &ORDER)?;
        if let Some(url) = non_blank(&self.thumbnail_url) {
            Url::parse(&url)
                .map_err(|_| AdminError::Validation("Please enter a valid URL".to_string()))?;
        }
        Ok(())
    }

    pub fn values(&self) -> CourseValues {
        let form = self.trimmed();
        CourseValues {
            description: non_blank(&form.description),
            thumbnail_url: non_blank(&form.thumbnail_url),
            title: form.title,
            category: form.category,
            is_published: form.is_published,
        }
    }
}

impl From<&Course> for CourseForm {
    fn from(course: &Course) -> Self {
        Self {
            title: course.title.clone(),
            description: course.description.clone().unwrap_or_default(),
            category: course.category,
            thumbnail_url: course.thumbnail_url.clone().unwrap_or_default(),
            is_published: course.published(),
        }
    }
}

/// Create and edit share one form; `id` tells them apart.
pub struct CourseFormPage {
    data: DataProvider,
    id: Option<String>,
    pub form: CourseForm,
    saving: PendingFlag,
    error: Option<String>,
}

impl CourseFormPage {
    pub fn create(data: DataProvider) -> Self {
        Self {
            data,
            id: None,
            form: CourseForm::default(),
            saving: PendingFlag::new(),
            error: None,
        }
    }

    pub async fn edit(data: DataProvider, id: &str) -> AdminResult<Self> {
        let course: Course = data.one(Resource::Courses, id).await?;
        Ok(Self {
            form: CourseForm::from(&course),
            id: Some(course.id),
            ..Self::create(data)
        })
    }

    pub fn is_edit(&self) -> bool {
        self.id.is_some()
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
            Ok(()) => SubmitOutcome::Navigate(Resource::Courses.list_path()),
            Err(err) => SubmitOutcome::from_error(&err),
        };
        self.error = outcome.error_message().map(str::to_string);
        outcome
    }

    async fn save(&self) -> AdminResult<()> {
        self.form.check()?;
        let values = self.form.values();
        let saved = match &self.id {
            Some(id) => self.data.update(Resource::Courses, id, &values).await?,
            None => self.data.create(Resource::Courses, &values).await?,
        };
        info!(
            course_id = ?saved.data.get("id"),
            title = %values.title,
            edit = self.is_edit(),
            "Course saved"
        );
        Ok(())
    }
}

/// Course details plus its phases.
pub struct CourseShowPage {
    course: Course,
    pub phases: PhasesSection,
}

impl CourseShowPage {
    pub async fn load(data: DataProvider, id: &str) -> AdminResult<Self> {
        let course: Course = data.one(Resource::Courses, id).await?;
        let mut phases = PhasesSection::new(data, &course.id);
        phases.fetch().await?;
        Ok(Self { course, phases })
    }

    pub fn course(&self) -> &Course {
        &self.course
    }

    pub fn edit_path(&self) -> Option<String> {
        Resource::Courses.edit_path(&self.course.id)
    }
}
