//! # Tecmarsign Academy admin console
//!
//! Administration of users, courses, course phases, enrollments and
//! payments stored in a hosted Supabase project (PostgREST + GoTrue).
//!
//! ## Architecture
//!
//! - **domain**: entities, the list query model and the backend ports
//! - **application**: data and auth providers, the resource registry
//! - **infrastructure**: Supabase HTTP adapters and an in-memory backend
//! - **interfaces**: route guard, navigation shell, page controllers
//! - **notifications**: auth-state event bus
//! - **shared**: errors, pagination, form validation

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod notifications;
pub mod shared;
pub mod telemetry;

use std::sync::Arc;

pub use application::{AuthProvider, DataProvider, Resource};
pub use config::{default_config_path, AppConfig};
pub use shared::{AdminError, AdminResult};

/// Providers wired to the hosted backend described by `config`.
pub fn connect_supabase(config: &AppConfig) -> AdminResult<AuthProvider> {
    let backend = infrastructure::connect(&config.backend)?;
    let data = DataProvider::new(backend.rows);
    Ok(AuthProvider::new(backend.auth, data))
}

/// Providers wired to a fresh in-memory backend.
pub fn in_memory() -> (
    Arc<infrastructure::InMemoryRowStore>,
    Arc<infrastructure::InMemoryAuth>,
    AuthProvider,
) {
    let rows = Arc::new(infrastructure::InMemoryRowStore::new());
    let auth = Arc::new(infrastructure::InMemoryAuth::new(rows.clone()));
    let provider = AuthProvider::new(auth.clone(), DataProvider::new(rows.clone()));
    (rows, auth, provider)
}
