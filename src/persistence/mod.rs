pub mod sqlite;
pub mod traits;

pub use sqlite::SqlitePersistence;
pub use traits::Persistence;
