//! In-process backend used by tests and offline demos

pub mod auth;
mod eval;
pub mod rows;

pub use auth::{InMemoryAuth, RecoveryEmail};
pub use rows::InMemoryRowStore;
