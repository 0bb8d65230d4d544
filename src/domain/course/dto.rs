use serde::Serialize;

use super::CourseCategory;

/// Insert / update payload for a `courses` row.
///
/// Empty description and thumbnail are written as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseValues {
    pub title: String,
    pub description: Option<String>,
    pub category: CourseCategory,
    pub thumbnail_url: Option<String>,
    pub is_published: bool,
}
