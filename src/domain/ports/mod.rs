//! Domain ports (hexagonal architecture boundaries)
//!
//! The console owns no data: every read and write crosses one of these
//! traits to the hosted backend. `infrastructure::supabase` implements
//! them over HTTP, `infrastructure::memory` in-process.

pub mod outbound;

pub use outbound::{AuthGateway, RowStore};
