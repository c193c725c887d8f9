use uuid::Uuid;

use temp_dashboard::models::{EnvStatus, EnvironmentRecord, E2E_UNTESTED};
use temp_dashboard::state::AppState;

/// Factory for creating test data
pub struct Factory<'a> {
    state: &'a AppState,
}

#[allow(dead_code)]
impl<'a> Factory<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Insert a record directly into the store
    pub async fn create_record(&self, status: EnvStatus, create_data: &str) -> EnvironmentRecord {
        let id = Uuid::new_v4().to_string();
        let record = EnvironmentRecord {
            id: id.clone(),
            name: format!("env-{}", &id[..8]),
            branch: "main".to_string(),
            url: format!("https://{}.example.com", &id[..8]),
            env_status: status,
            e2e: E2E_UNTESTED.to_string(),
            priority: String::new(),
            create_data: create_data.to_string(),
        };

        self.state.environments.insert(&record).await.unwrap();
        record
    }

    /// Insert a record with a fixed id and url
    pub async fn create_record_with_id(&self, id: &str, url: &str) -> EnvironmentRecord {
        let record = EnvironmentRecord {
            id: id.to_string(),
            name: "env1".to_string(),
            branch: "main".to_string(),
            url: url.to_string(),
            env_status: EnvStatus::Creating,
            e2e: E2E_UNTESTED.to_string(),
            priority: String::new(),
            create_data: "2024-01-01T00:00:00.000Z".to_string(),
        };

        self.state.environments.insert(&record).await.unwrap();
        record
    }

    /// Fetch a record from the store
    pub async fn find(&self, id: &str) -> Option<EnvironmentRecord> {
        self.state.environments.find(id).await.unwrap()
    }
}
