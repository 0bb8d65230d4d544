//! Course entity (`courses` table)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Course category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum CourseCategory {
    #[default]
    Tech,
    Marketing,
    Design,
}

impl CourseCategory {
    pub const ALL: [CourseCategory; 3] = [
        CourseCategory::Tech,
        CourseCategory::Marketing,
        CourseCategory::Design,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tech => "tech",
            Self::Marketing => "marketing",
            Self::Design => "design",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Tech => "Tech",
            Self::Marketing => "Marketing",
            Self::Design => "Design",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "tech" => Some(Self::Tech),
            "marketing" => Some(Self::Marketing),
            "design" => Some(Self::Design),
            _ => None,
        }
    }
}

impl From<String> for CourseCategory {
    fn from(s: String) -> Self {
        Self::parse(&s).unwrap_or_default()
    }
}

impl std::fmt::Display for CourseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Course row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: CourseCategory,
    #[serde(default)]
    pub is_published: Option<bool>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Course {
    pub fn published(&self) -> bool {
        self.is_published.unwrap_or(false)
    }

    pub fn status_label(&self) -> &'static str {
        if self.published() {
            "Published"
        } else {
            "Draft"
        }
    }
}
