pub mod directory;
pub mod memory;
pub mod postgres;

pub use directory::{LookupError, User, UserDirectory};
pub use memory::InMemoryUserDirectory;
pub use postgres::PgUserDirectory;
