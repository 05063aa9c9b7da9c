pub mod error;
pub mod supabase;

pub use error::{DatabaseError, is_unique_violation};
pub use supabase::SupabaseClient;
