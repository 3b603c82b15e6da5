// src/config/db.rs
// DOCUMENTATION: Database pool and schema setup
// PURPOSE: Build the PostgreSQL pool from Config and apply embedded migrations

use crate::config::Config;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Idle connections are closed after 5 minutes
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Connections are recycled after 30 minutes
const MAX_LIFETIME: Duration = Duration::from_secs(1800);

/// Pool settings taken from Config
pub fn pool_options(config: &Config) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connection_timeout))
        .idle_timeout(IDLE_TIMEOUT)
        .max_lifetime(MAX_LIFETIME)
}

/// Connection string with the password masked, for logging
fn redacted_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            let credentials = &url[scheme_end + 3..at];
            match credentials.split_once(':') {
                Some((user, _)) => format!("{}{}:***{}", &url[..scheme_end + 3], user, &url[at..]),
                None => url.to_string(),
            }
        }
        _ => url.to_string(),
    }
}

/// Connect and verify the pool with a round trip
/// Called once during startup in main.rs and by the seed binary
pub async fn init_db_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    log::info!("Initializing database pool: {}", redacted_url(&config.database_url));

    let pool = pool_options(config).connect(&config.database_url).await?;
    sqlx::query("SELECT 1").execute(&pool).await?;

    log::info!("Database pool initialized successfully");
    Ok(pool)
}

/// Apply the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    log::info!("Running database migrations");
    sqlx::migrate!("./migrations").run(pool).await?;
    log::info!("Database migrations applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_options_follow_config() {
        let mut config = Config::for_tests();
        config.db_max_connections = 7;
        config.db_connection_timeout = 4;

        let options = pool_options(&config);
        assert_eq!(options.get_max_connections(), 7);
        assert_eq!(options.get_acquire_timeout(), Duration::from_secs(4));
        assert_eq!(options.get_idle_timeout(), Some(IDLE_TIMEOUT));
        assert_eq!(options.get_max_lifetime(), Some(MAX_LIFETIME));
    }

    #[test]
    fn test_redacted_url_hides_password() {
        assert_eq!(
            redacted_url("postgresql://realty:s3cret@db:5432/realty"),
            "postgresql://realty:***@db:5432/realty"
        );
        assert_eq!(
            redacted_url("postgresql://localhost/realty"),
            "postgresql://localhost/realty"
        );
    }
}
