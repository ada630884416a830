use async_trait::async_trait;
use atelier_core::models::Role;
use atelier_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Lookup of user identities, used when resolving collaborator candidates
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Subset of `ids` that exist and hold one of `roles`
    async fn find_with_roles(&self, ids: &[Uuid], roles: &[Role]) -> Result<Vec<Uuid>, AppError>;
}

#[derive(Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    #[tracing::instrument(skip(self, ids), fields(db.table = "users", db.operation = "select", candidates = ids.len()))]
    async fn find_with_roles(&self, ids: &[Uuid], roles: &[Role]) -> Result<Vec<Uuid>, AppError> {
        if ids.is_empty() || roles.is_empty() {
            return Ok(Vec::new());
        }

        let role_names: Vec<String> = roles.iter().map(|r| r.to_string()).collect();

        let found = sqlx::query_scalar::<Postgres, Uuid>(
            "SELECT id FROM users WHERE id = ANY($1) AND role = ANY($2)",
        )
        .bind(ids)
        .bind(&role_names)
        .fetch_all(&self.pool)
        .await?;

        Ok(found)
    }
}
