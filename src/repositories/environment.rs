use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entity::environment::{self, ActiveModel, Column, Entity as EnvironmentEntity};
use crate::error::{AppError, AppResult};
use crate::models::{AttributeUpdate, EnvironmentRecord};
use crate::repositories::EnvironmentRepository;

/// PostgreSQL-backed record store
#[derive(Clone)]
pub struct SeaOrmEnvironmentRepository {
    db: DatabaseConnection,
}

impl SeaOrmEnvironmentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EnvironmentRepository for SeaOrmEnvironmentRepository {
    async fn insert(&self, record: &EnvironmentRecord) -> AppResult<()> {
        let model = ActiveModel {
            id: Set(record.id.clone()),
            name: Set(record.name.clone()),
            branch: Set(record.branch.clone()),
            url: Set(record.url.clone()),
            env_status: Set(record.env_status.as_str().to_string()),
            e2e: Set(record.e2e.clone()),
            priority: Set(record.priority.clone()),
            create_data: Set(record.create_data.clone()),
        };

        model.insert(&self.db).await?;
        tracing::debug!(environment_id = %record.id, "Record inserted");
        Ok(())
    }

    async fn find(&self, id: &str) -> AppResult<Option<EnvironmentRecord>> {
        EnvironmentEntity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .map(EnvironmentRecord::try_from)
            .transpose()
    }

    async fn update_attribute(&self, id: &str, update: AttributeUpdate) -> AppResult<()> {
        let (column, value) = match &update {
            AttributeUpdate::EnvStatus(status) => (Column::EnvStatus, status.as_str().to_string()),
            AttributeUpdate::E2e(result) => (Column::E2e, result.clone()),
        };

        let result = EnvironmentEntity::update_many()
            .col_expr(column, Expr::value(value))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Environment".to_string()));
        }

        tracing::debug!(environment_id = %id, attribute = update.attribute(), "Record updated");
        Ok(())
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let result = EnvironmentEntity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Environment".to_string()));
        }

        tracing::debug!(environment_id = %id, "Record deleted");
        Ok(())
    }

    async fn scan(&self) -> AppResult<Vec<EnvironmentRecord>> {
        let models = EnvironmentEntity::find().all(&self.db).await?;
        models.into_iter().map(EnvironmentRecord::try_from).collect()
    }
}

// Conversion from SeaORM model to our domain model
impl TryFrom<environment::Model> for EnvironmentRecord {
    type Error = AppError;

    fn try_from(m: environment::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            env_status: m.env_status.parse()?,
            id: m.id,
            name: m.name,
            branch: m.branch,
            url: m.url,
            e2e: m.e2e,
            priority: m.priority,
            create_data: m.create_data,
        })
    }
}
