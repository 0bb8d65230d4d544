pub mod model;

pub use model::{CoursePhase, PhaseValues};
