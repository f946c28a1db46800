use crate::error::DbError;
use configuration::DatabaseConfig;
use sqlx::{PgPool, postgres::PgPoolOptions};

/// Establishes a connection pool to the PostgreSQL database.
///
/// Each handler checks a connection out of this pool per query (or per
/// transaction) and it is returned when the query finishes, whether it succeeded
/// or not.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    if config.url.trim().is_empty() {
        return Err(DbError::ConnectionConfigError(
            "DATABASE_URL must be set.".to_string(),
        ));
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect(&config.url)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        "Connected to the database."
    );
    Ok(pool)
}

/// Creates the `bins` and `reports` tables if they do not exist yet.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    // Use a relative path from the crate root
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database schema is up to date.");
    Ok(())
}
