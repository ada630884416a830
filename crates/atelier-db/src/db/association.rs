use async_trait::async_trait;
use atelier_core::models::ContestEntry;
use atelier_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Project to contest entries
#[async_trait]
pub trait AssociationRepository: Send + Sync {
    async fn exists(&self, project_id: Uuid, parent_id: Uuid) -> Result<bool, AppError>;

    async fn insert(&self, project_id: Uuid, parent_id: Uuid) -> Result<ContestEntry, AppError>;

    async fn list_for_parent(&self, parent_id: Uuid) -> Result<Vec<ContestEntry>, AppError>;
}

#[derive(Clone)]
pub struct PostgresAssociationRepository {
    pool: PgPool,
}

impl PostgresAssociationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssociationRepository for PostgresAssociationRepository {
    #[tracing::instrument(skip(self), fields(db.table = "contest_entries", db.operation = "select"))]
    async fn exists(&self, project_id: Uuid, parent_id: Uuid) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM contest_entries WHERE project_id = $1 AND parent_id = $2)",
        )
        .bind(project_id)
        .bind(parent_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    #[tracing::instrument(skip(self), fields(db.table = "contest_entries", db.operation = "insert"))]
    async fn insert(&self, project_id: Uuid, parent_id: Uuid) -> Result<ContestEntry, AppError> {
        let entry = sqlx::query_as::<Postgres, ContestEntry>(
            r#"
            INSERT INTO contest_entries (project_id, parent_id)
            VALUES ($1, $2)
            RETURNING project_id, parent_id, winner, created_at
            "#,
        )
        .bind(project_id)
        .bind(parent_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    #[tracing::instrument(skip(self), fields(db.table = "contest_entries", db.operation = "select"))]
    async fn list_for_parent(&self, parent_id: Uuid) -> Result<Vec<ContestEntry>, AppError> {
        let entries = sqlx::query_as::<Postgres, ContestEntry>(
            r#"
            SELECT project_id, parent_id, winner, created_at
            FROM contest_entries
            WHERE parent_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
