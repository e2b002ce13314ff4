use sqlx::mysql::MySqlPool;
use tracing::{debug, warn};

pub mod token;
pub mod transaction;

pub use token::{AnyTokenStore, MemoryTokenStore, MySqlTokenStore, TokenStore};

const CREATE_TABLES_SQL: &str = include_str!("../../migrations/create_tables.sql");

/// Connect to MySQL and create the tables if needed
pub async fn init_db(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    let pool = MySqlPool::connect(database_url).await?;

    create_tables(&pool).await;

    Ok(pool)
}

/// Run each statement of the schema file; failures are logged, not fatal
async fn create_tables(pool: &MySqlPool) {
    for statement in CREATE_TABLES_SQL.split(';') {
        let trimmed = statement.trim();
        if trimmed.is_empty() {
            continue;
        }

        match sqlx::raw_sql(trimmed).execute(pool).await {
            Ok(_) => debug!("Executed schema statement"),
            Err(e) => warn!("Failed to create tables: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements() {
        let statements: Vec<&str> = CREATE_TABLES_SQL
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("CREATE TABLE IF NOT EXISTS paypal_token"));
        assert!(statements[0].contains("client_id VARCHAR"));
        assert!(statements[1].contains("CREATE TABLE IF NOT EXISTS paypal_transaction"));
    }
}
