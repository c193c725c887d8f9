use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};
use crate::models::{AttributeUpdate, EnvironmentRecord};
use crate::repositories::EnvironmentRepository;

/// In-memory record store for tests and local runs
#[derive(Clone, Default)]
pub struct InMemoryEnvironmentRepository {
    records: Arc<Mutex<BTreeMap<String, EnvironmentRecord>>>,
}

impl InMemoryEnvironmentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EnvironmentRepository for InMemoryEnvironmentRepository {
    async fn insert(&self, record: &EnvironmentRecord) -> AppResult<()> {
        let mut records = self.records.lock().await;
        if records.contains_key(&record.id) {
            return Err(AppError::Conflict("Environment".to_string()));
        }
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn find(&self, id: &str) -> AppResult<Option<EnvironmentRecord>> {
        let records = self.records.lock().await;
        Ok(records.get(id).cloned())
    }

    async fn update_attribute(&self, id: &str, update: AttributeUpdate) -> AppResult<()> {
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound("Environment".to_string()))?;
        update.apply(record);
        Ok(())
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let mut records = self.records.lock().await;
        records
            .remove(id)
            .ok_or_else(|| AppError::NotFound("Environment".to_string()))?;
        Ok(())
    }

    async fn scan(&self) -> AppResult<Vec<EnvironmentRecord>> {
        let records = self.records.lock().await;
        Ok(records.values().cloned().collect())
    }
}
