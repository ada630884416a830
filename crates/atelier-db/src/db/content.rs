use async_trait::async_trait;
use atelier_core::models::{ContentItem, ContentStatus, CoreFields, NewContent};
use atelier_core::AppError;
use serde_json::Value;
use sqlx::{PgPool, Postgres};
use std::collections::HashMap;
use uuid::Uuid;

/// Content items with their metadata, free-text tags and classification terms
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Insert a new item (core fields and tags only) and return it with its id
    async fn create(&self, new: &NewContent) -> Result<ContentItem, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<ContentItem>, AppError>;

    /// Delete an item with its metadata, tags and classification. Returns whether it existed.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    /// Write title, body and status, and replace the tag set wholesale
    async fn update_core(&self, id: Uuid, core: &CoreFields) -> Result<ContentItem, AppError>;

    async fn set_status(&self, id: Uuid, status: ContentStatus) -> Result<(), AppError>;

    async fn set_primary_image(&self, id: Uuid, image_id: Option<Uuid>) -> Result<(), AppError>;

    async fn get_metadata(&self, id: Uuid) -> Result<HashMap<String, Value>, AppError>;

    async fn set_metadata(&self, id: Uuid, key: &str, value: &Value) -> Result<(), AppError>;

    async fn get_tags(&self, id: Uuid) -> Result<Vec<String>, AppError>;

    /// Assign (or with `None`, clear) the term an item is classified under in `taxonomy`
    async fn set_classification(
        &self,
        id: Uuid,
        taxonomy: &str,
        term: Option<&str>,
    ) -> Result<(), AppError>;

    async fn get_classification(&self, id: Uuid, taxonomy: &str)
        -> Result<Option<String>, AppError>;
}

const CONTENT_COLUMNS: &str =
    "id, content_type, author_id, status, title, body, primary_image_id, created_at, updated_at";

/// PostgreSQL implementation of [`ContentRepository`]
#[derive(Clone)]
pub struct PostgresContentRepository {
    pool: PgPool,
}

impl PostgresContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentRepository for PostgresContentRepository {
    #[tracing::instrument(skip(self, new), fields(db.table = "content_items", db.operation = "insert"))]
    async fn create(&self, new: &NewContent) -> Result<ContentItem, AppError> {
        let mut tx = self.pool.begin().await?;

        let item = sqlx::query_as::<Postgres, ContentItem>(&format!(
            r#"
            INSERT INTO content_items (content_type, author_id, status, title, body)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CONTENT_COLUMNS}
            "#
        ))
        .bind(new.content_type)
        .bind(new.author_id)
        .bind(new.core.status)
        .bind(&new.core.title)
        .bind(&new.core.body)
        .fetch_one(&mut *tx)
        .await?;

        for tag in &new.core.tags {
            sqlx::query(
                "INSERT INTO content_tags (content_id, tag) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(item.id)
            .bind(tag)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(item)
    }

    #[tracing::instrument(skip(self), fields(db.table = "content_items", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<ContentItem>, AppError> {
        let item = sqlx::query_as::<Postgres, ContentItem>(&format!(
            "SELECT {CONTENT_COLUMNS} FROM content_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    #[tracing::instrument(skip(self), fields(db.table = "content_items", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        // metadata, tags and categories cascade
        let result = sqlx::query("DELETE FROM content_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self, core), fields(db.table = "content_items", db.operation = "update", db.record_id = %id))]
    async fn update_core(&self, id: Uuid, core: &CoreFields) -> Result<ContentItem, AppError> {
        let mut tx = self.pool.begin().await?;

        let item = sqlx::query_as::<Postgres, ContentItem>(&format!(
            r#"
            UPDATE content_items
            SET title = $2, body = $3, status = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {CONTENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&core.title)
        .bind(&core.body)
        .bind(core.status)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Content item {} not found", id)))?;

        sqlx::query("DELETE FROM content_tags WHERE content_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for tag in &core.tags {
            sqlx::query(
                "INSERT INTO content_tags (content_id, tag) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(tag)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(item)
    }

    #[tracing::instrument(skip(self), fields(db.table = "content_items", db.operation = "update", db.record_id = %id))]
    async fn set_status(&self, id: Uuid, status: ContentStatus) -> Result<(), AppError> {
        sqlx::query("UPDATE content_items SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "content_items", db.operation = "update", db.record_id = %id))]
    async fn set_primary_image(&self, id: Uuid, image_id: Option<Uuid>) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE content_items SET primary_image_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(image_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "content_meta", db.operation = "select", db.record_id = %id))]
    async fn get_metadata(&self, id: Uuid) -> Result<HashMap<String, Value>, AppError> {
        let rows = sqlx::query_as::<Postgres, (String, Value)>(
            "SELECT meta_key, meta_value FROM content_meta WHERE content_id = $1",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    #[tracing::instrument(skip(self, value), fields(db.table = "content_meta", db.operation = "upsert", db.record_id = %id))]
    async fn set_metadata(&self, id: Uuid, key: &str, value: &Value) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO content_meta (content_id, meta_key, meta_value)
            VALUES ($1, $2, $3)
            ON CONFLICT (content_id, meta_key) DO UPDATE SET meta_value = EXCLUDED.meta_value
            "#,
        )
        .bind(id)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "content_tags", db.operation = "select", db.record_id = %id))]
    async fn get_tags(&self, id: Uuid) -> Result<Vec<String>, AppError> {
        let tags = sqlx::query_scalar::<Postgres, String>(
            "SELECT tag FROM content_tags WHERE content_id = $1 ORDER BY tag ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tags)
    }

    #[tracing::instrument(skip(self), fields(db.table = "content_categories", db.operation = "upsert", db.record_id = %id))]
    async fn set_classification(
        &self,
        id: Uuid,
        taxonomy: &str,
        term: Option<&str>,
    ) -> Result<(), AppError> {
        match term {
            Some(term) => {
                sqlx::query(
                    r#"
                    INSERT INTO content_categories (content_id, taxonomy, term)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (content_id, taxonomy) DO UPDATE SET term = EXCLUDED.term
                    "#,
                )
                .bind(id)
                .bind(taxonomy)
                .bind(term)
                .execute(&self.pool)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM content_categories WHERE content_id = $1 AND taxonomy = $2")
                    .bind(id)
                    .bind(taxonomy)
                    .execute(&self.pool)
                    .await?;
            }
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "content_categories", db.operation = "select", db.record_id = %id))]
    async fn get_classification(
        &self,
        id: Uuid,
        taxonomy: &str,
    ) -> Result<Option<String>, AppError> {
        let term = sqlx::query_scalar::<Postgres, String>(
            "SELECT term FROM content_categories WHERE content_id = $1 AND taxonomy = $2",
        )
        .bind(id)
        .bind(taxonomy)
        .fetch_optional(&self.pool)
        .await?;
        Ok(term)
    }
}
