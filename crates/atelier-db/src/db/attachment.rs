use async_trait::async_trait;
use atelier_core::models::{Attachment, NewAttachment};
use atelier_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    /// Record already-stored bytes as an attachment of `new.parent_id`
    async fn register(&self, new: &NewAttachment) -> Result<Attachment, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Attachment>, AppError>;

    async fn list_for_parent(&self, parent_id: Uuid) -> Result<Vec<Attachment>, AppError>;
}

const ATTACHMENT_COLUMNS: &str = "id, parent_id, filename, original_filename, storage_key, \
     storage_url, declared_mime, mime_type, file_size, width, height, created_at";

#[derive(Clone)]
pub struct PostgresAttachmentRepository {
    pool: PgPool,
}

impl PostgresAttachmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttachmentRepository for PostgresAttachmentRepository {
    #[tracing::instrument(skip(self, new), fields(db.table = "attachments", db.operation = "insert", parent_id = %new.parent_id))]
    async fn register(&self, new: &NewAttachment) -> Result<Attachment, AppError> {
        let attachment = sqlx::query_as::<Postgres, Attachment>(&format!(
            r#"
            INSERT INTO attachments
                (parent_id, filename, original_filename, storage_key, storage_url,
                 declared_mime, mime_type, file_size, width, height)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ATTACHMENT_COLUMNS}
            "#
        ))
        .bind(new.parent_id)
        .bind(&new.filename)
        .bind(&new.original_filename)
        .bind(&new.storage_key)
        .bind(&new.storage_url)
        .bind(&new.declared_mime)
        .bind(&new.mime_type)
        .bind(new.file_size)
        .bind(new.width)
        .bind(new.height)
        .fetch_one(&self.pool)
        .await?;

        Ok(attachment)
    }

    #[tracing::instrument(skip(self), fields(db.table = "attachments", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<Attachment>, AppError> {
        let attachment = sqlx::query_as::<Postgres, Attachment>(&format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attachment)
    }

    #[tracing::instrument(skip(self), fields(db.table = "attachments", db.operation = "select"))]
    async fn list_for_parent(&self, parent_id: Uuid) -> Result<Vec<Attachment>, AppError> {
        let attachments = sqlx::query_as::<Postgres, Attachment>(&format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE parent_id = $1 ORDER BY created_at ASC"
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attachments)
    }
}
