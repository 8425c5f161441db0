use std::time::Duration;

use schedly_core::AppError;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

static MIGRATOR: Migrator = sqlx::migrate!("../../crates/infrastructure/migrations");

/// Opens the event store pool and brings the schema up to date.
///
/// An unreachable database surfaces as `StorageUnavailable` so start-up
/// failures read the same as request-time outages.
pub async fn connect_and_migrate(database_url: &str) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .map_err(|error| {
            AppError::StorageUnavailable(format!("event store database is unreachable: {error}"))
        })?;

    MIGRATOR
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("event store migration failed: {error}")))?;

    tracing::debug!(
        migrations = MIGRATOR.iter().count(),
        "event store schema is current"
    );

    Ok(pool)
}
