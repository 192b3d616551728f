pub mod directory;

pub use directory::{InMemoryUserDirectory, SupabaseUserDirectory, UserDirectory};
