use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the data-access layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Row decode error: {0}")]
    Decode(String),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Map a unique-constraint violation to `Conflict`, passing other errors through.
    pub fn from_insert(err: sqlx::Error, what: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DatabaseError::Conflict(format!("{} already exists", what))
            }
            _ => DatabaseError::Sqlx(err),
        }
    }
}

/// Opens the process-wide connection pool. Called once at startup.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
    let url = config
        .url
        .as_deref()
        .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

    info!("Creating database connection pool...");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout))
        .idle_timeout(Duration::from_secs(600))
        .connect(url)
        .await?;

    info!("Database connection pool created");
    Ok(pool)
}

/// Applies the SQL files under `migrations/`.
pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Migrations complete");
    Ok(())
}
