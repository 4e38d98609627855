pub mod catalog;
pub mod connection;
pub mod fixtures;
pub mod memory;
pub mod migrations;

pub use catalog::{RepositoryError, SqlCatalogStore};
pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{DemoCatalog, SeedResult, VerificationResult};
pub use memory::InMemoryCatalogStore;
