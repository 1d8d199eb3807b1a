//! Startup helpers shared by the binary and the integration tests.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{DatabaseConfig, LOG_ENV_VAR};
use crate::{StoreError, StoreResult};

const MAX_CONNECT_ATTEMPTS: u32 = 10;
const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(200);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Initialize tracing with the STOREFRONT_LOG environment variable.
///
/// Defaults to "info" level if STOREFRONT_LOG is not set.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Builds the connection pool, retrying with exponential backoff while the
/// database is still coming up.
pub async fn connect_pool(settings: &DatabaseConfig) -> StoreResult<PgPool> {
    let options = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs));

    let mut delay = INITIAL_RETRY_DELAY;
    let mut attempt = 0;
    loop {
        attempt += 1;
        match options.clone().connect(&settings.url).await {
            Ok(pool) => {
                info!(max_connections = settings.max_connections, "database pool ready");
                return Ok(pool);
            }
            Err(e) if attempt < MAX_CONNECT_ATTEMPTS => {
                warn!(
                    attempt,
                    max_attempts = MAX_CONNECT_ATTEMPTS,
                    error = %e,
                    "database not reachable, retrying in {:?}",
                    delay
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, MAX_RETRY_DELAY);
            }
            Err(e) => return Err(StoreError::Database(e)),
        }
    }
}

/// Applies the embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> StoreResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Internal(format!("migration failed: {e}")))?;
    info!("migrations applied");
    Ok(())
}
