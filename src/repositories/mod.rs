pub mod environment;
pub mod memory;

pub use environment::SeaOrmEnvironmentRepository;
pub use memory::InMemoryEnvironmentRepository;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{AttributeUpdate, EnvironmentRecord};

/// Record store for environment records, keyed by `id`.
/// Every method is a single atomic operation; there are no conditional writes.
#[async_trait]
pub trait EnvironmentRepository: Send + Sync {
    /// Insert a new record. Fails with `Conflict` if the id is taken.
    async fn insert(&self, record: &EnvironmentRecord) -> AppResult<()>;

    /// Find a record by id
    async fn find(&self, id: &str) -> AppResult<Option<EnvironmentRecord>>;

    /// Overwrite one attribute of an existing record
    async fn update_attribute(&self, id: &str, update: AttributeUpdate) -> AppResult<()>;

    /// Remove a record
    async fn delete(&self, id: &str) -> AppResult<()>;

    /// Every record, in no particular order
    async fn scan(&self) -> AppResult<Vec<EnvironmentRecord>>;
}
