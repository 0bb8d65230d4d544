//! Course aggregate

pub mod model;

mod dto;

pub use dto::CourseValues;
pub use model::{Course, CourseCategory};
