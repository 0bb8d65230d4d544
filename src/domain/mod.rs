//! Domain layer: entities, query model and the ports to the backend.

pub mod course;
pub mod course_phase;
pub mod enrollment;
pub mod identity;
pub mod payment;
pub mod ports;
pub mod query;
pub mod reports;
pub mod user;

pub use course::{Course, CourseCategory, CourseValues};
pub use course_phase::{CoursePhase, PhaseValues};
pub use enrollment::{EmbeddedName, Enrollment, EnrollmentValues, PaymentStatus};
pub use identity::{AuthEvent, AuthUser, Credentials, Identity, Session};
pub use payment::{Payment, PaymentState};
pub use ports::{AuthGateway, RowStore};
pub use query::{Filter, FilterOperator, ListParams, RowPage, SortOrder, Sorter};
pub use reports::{EnrollmentStats, ReportView, RevenueSummary, UserStats};
pub use user::{CreateUserDto, NewUserMetadata, UpdateUserDto, User, UserRole};

pub use crate::shared::{AdminError, AdminResult};
