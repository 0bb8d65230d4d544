//! Infrastructure layer - backend adapters behind the domain ports

pub mod memory;
pub mod session;
pub mod supabase;

pub use memory::{InMemoryAuth, InMemoryRowStore};
pub use session::SessionStore;
pub use supabase::{connect, SupabaseAuth, SupabaseBackend, SupabaseRest};
