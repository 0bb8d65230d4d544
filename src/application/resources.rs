//! Resource registry: table names, route paths and navigation metadata.

/// A named remote collection exposed through the CRUD verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Courses,
    CoursePhases,
    Enrollments,
    Payments,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Users,
        Resource::Courses,
        Resource::CoursePhases,
        Resource::Enrollments,
        Resource::Payments,
    ];

    /// Backing table.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Courses => "courses",
            Self::CoursePhases => "course_phases",
            Self::Enrollments => "enrollments",
            Self::Payments => "payments",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Users => "Users",
            Self::Courses => "Courses",
            Self::CoursePhases => "Course Phases",
            Self::Enrollments => "Enrollments",
            Self::Payments => "Payments",
        }
    }

    /// Singular noun for messages ("Course deleted").
    pub fn singular(&self) -> &'static str {
        match self {
            Self::Users => "User",
            Self::Courses => "Course",
            Self::CoursePhases => "Phase",
            Self::Enrollments => "Enrollment",
            Self::Payments => "Payment",
        }
    }

    pub fn icon(&self) -> Option<&'static str> {
        match self {
            Self::Users => Some("users"),
            Self::Courses => Some("book-open"),
            Self::CoursePhases => None,
            Self::Enrollments => Some("clipboard-list"),
            Self::Payments => Some("credit-card"),
        }
    }

    /// Phases are managed from their course.
    pub fn parent(&self) -> Option<Resource> {
        match self {
            Self::CoursePhases => Some(Self::Courses),
            _ => None,
        }
    }

    /// List path; phases live under the course show page.
    pub fn list_path(&self) -> String {
        match self {
            Self::CoursePhases => "/courses".to_string(),
            other => format!("/{}", other.name()),
        }
    }

    pub fn create_path(&self) -> Option<String> {
        match self {
            Self::Users | Self::Courses | Self::Enrollments => {
                Some(format!("/{}/create", self.name()))
            }
            _ => None,
        }
    }

    pub fn edit_path(&self, id: &str) -> Option<String> {
        match self {
            Self::Users | Self::Courses | Self::Enrollments => {
                Some(format!("/{}/edit/{}", self.name(), id))
            }
            _ => None,
        }
    }

    pub fn show_path(&self, id: &str) -> Option<String> {
        match self {
            Self::Courses | Self::Payments => Some(format!("/{}/show/{}", self.name(), id)),
            _ => None,
        }
    }

    /// Payments are recorded by the payment gateway, never by hand.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::Payments)
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
