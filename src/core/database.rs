use crate::core::config::DatabaseConfig;
use crate::core::error::AppError;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::future::Future;
use std::time::Duration;

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .connect(&config.url)
        .await
}

/// Convert database error to a more specific AppError
pub fn handle_db_error(operation: &str, e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        // Foreign key violation (PostgreSQL error code 23503): unknown prompt id
        if db_err.code() == Some(std::borrow::Cow::Borrowed("23503")) {
            return AppError::NotFound(format!("{}: referenced prompt does not exist", operation));
        }

        // Check violation (PostgreSQL error code 23514): blank customization content
        if db_err.code() == Some(std::borrow::Cow::Borrowed("23514")) {
            return AppError::InvalidContent(format!(
                "{}: customization content must not be empty",
                operation
            ));
        }
    }

    tracing::error!("Database error during {}: {:?}", operation, e);
    AppError::NotAvailable(format!("{}: {}", operation, e))
}

/// Run a query with an upper time bound.
///
/// An elapsed timeout is reported as [`AppError::NotAvailable`]; driver
/// errors go through [`handle_db_error`].
pub async fn bounded<T, F>(limit: Duration, operation: &str, query: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, query).await {
        Ok(result) => result.map_err(|e| handle_db_error(operation, e)),
        Err(_) => {
            tracing::error!("Database call timed out after {:?} during {}", limit, operation);
            Err(AppError::NotAvailable(format!(
                "{}: timed out after {}s",
                operation,
                limit.as_secs()
            )))
        }
    }
}
