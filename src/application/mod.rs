//! Application layer: the adapters pages talk to

pub mod auth_provider;
pub mod data_provider;
pub mod resources;

pub use auth_provider::{AuthOutcome, AuthProvider, CheckOutcome, ErrorOutcome, HOME_PATH, LOGIN_PATH};
pub use data_provider::{DataProvider, ListResponse, OneResponse};
pub use resources::Resource;
