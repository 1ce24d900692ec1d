// Storage layer for the FitSync server (the credential store and fitness records)
// Decision: Support both PostgreSQL (production) and in-memory (dev mode)
//
// - Database: PostgreSQL via sqlx, migrations embedded from ./migrations
// - InMemoryDatabase: HashMaps behind parking_lot locks
// - StorageBackend: enum dispatch over the two

pub mod backend;
pub mod memory;
pub mod models;
pub mod password;
pub mod repositories;

pub use backend::StorageBackend;
pub use memory::InMemoryDatabase;
pub use models::*;
pub use repositories::Database;
