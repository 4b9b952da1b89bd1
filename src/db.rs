use actix_web::rt::time::timeout;
use anyhow::{Context, Result};
use sqlx::{MySqlPool, mysql::MySqlPoolOptions};
use tracing::info;

use crate::config::Config;

/// Opens the pool, checks the database answers within the configured timeout
/// and applies pending migrations.
pub async fn init_db(config: &Config) -> Result<MySqlPool> {
    let pool = MySqlPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.db_connect_timeout)
        .connect_lazy(&config.database_url)
        .context("invalid DATABASE_URL")?;

    timeout(config.db_connect_timeout, sqlx::query("SELECT 1").execute(&pool))
        .await
        .context("database did not answer in time")?
        .context("failed to connect to database")?;
    info!(max_connections = config.db_max_connections, "Database connected");

    if config.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run migrations")?;
        info!("Migrations applied");
    }

    Ok(pool)
}
