use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};

const POOL_MAX: u32 = 20;
const POOL_MIN: u32 = 2;

/// Open the connection pool.
///
/// SQLite URLs get a single connection: an in-memory database exists per
/// connection, and room phase changes rely on serialized writes.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> anyhow::Result<DatabaseConnection> {
    let sqlite = database_url.starts_with("sqlite:");
    let (max, min) = if sqlite { (1, 1) } else { (POOL_MAX, POOL_MIN) };

    let mut opts = ConnectOptions::new(database_url);
    opts.max_connections(max)
        .min_connections(min)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(false);

    let db = Database::connect(opts).await?;
    tracing::debug!(sqlite, max_connections = max, "database pool ready");
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ConnectionTrait;

    #[tokio::test]
    async fn test_connect_in_memory_sqlite() {
        let db = connect("sqlite::memory:").await;
        assert!(db.is_ok());
        let Ok(db) = db else { return };
        assert!(db.ping().await.is_ok());
        assert_eq!(db.get_database_backend(), sea_orm::DatabaseBackend::Sqlite);
    }
}
