use std::time::Duration;

use anyhow::{bail, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Tables the application store reads and writes.
const REQUIRED_TABLES: [&str; 4] = ["admins", "candidates", "jobs", "applications"];

/// Connects to PostgreSQL and checks that the recruiting schema is present.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(30))
        .connect(database_url)
        .await?;

    for table in REQUIRED_TABLES {
        let present: Option<String> = sqlx::query_scalar("SELECT to_regclass($1)::text")
            .bind(table)
            .fetch_one(&pool)
            .await?;
        if present.is_none() {
            bail!("Required table '{table}' is missing from the database");
        }
    }

    info!("PostgreSQL connection pool established");
    Ok(pool)
}
