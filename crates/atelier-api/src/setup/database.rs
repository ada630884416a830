//! Database setup and initialization

use anyhow::{Context, Result};
use atelier_core::Config;
use atelier_db::{InMemoryStore, Repositories};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use std::time::Duration;

/// Repositories backed by PostgreSQL, or in memory when no database is configured
pub async fn setup_repositories(config: &Config) -> Result<Repositories> {
    match &config.database_url {
        Some(url) => {
            let pool = setup_database(config, url).await?;
            Ok(Repositories::postgres(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory repositories; data is lost on restart");
            Ok(Repositories::in_memory(InMemoryStore::new()))
        }
    }
}

/// Setup database connection pool and run migrations
pub async fn setup_database(config: &Config, database_url: &str) -> Result<PgPool> {
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await?;

    tracing::info!(
        max_connections = config.db_max_connections,
        "Database connected successfully"
    );

    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .context("Failed to load migrations")?;
    migrator
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}
