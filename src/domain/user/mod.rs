//! User aggregate
//!
//! Contains the User profile entity and its write DTOs.

pub mod model;

mod dto_create;
mod dto_update;

pub use model::{User, UserRole};

pub use dto_create::{CreateUserDto, NewUserMetadata};
pub use dto_update::UpdateUserDto;
