pub mod model;

pub use model::{EmbeddedName, Enrollment, EnrollmentValues, PaymentStatus};
