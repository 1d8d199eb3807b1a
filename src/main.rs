use std::sync::Arc;
use tracing::{info, warn};

use storefront::bootstrap::{connect_pool, init_tracing, run_migrations};
use storefront::config::Config;
use storefront::http::{self, AppState};
use storefront::payments::StripeGateway;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::load(None)?;
    if config.uses_insecure_secret() {
        warn!("auth.jwt_secret is the built-in development value; set STOREFRONT__AUTH__JWT_SECRET");
    }
    if config.payments.secret_key.is_empty() {
        warn!("payments.secret_key is empty; payment intents will be rejected by the processor");
    }

    let pool = connect_pool(&config.database).await?;
    run_migrations(&pool).await?;

    let gateway = Arc::new(StripeGateway::new(&config.payments)?);
    let state = AppState::new(pool.clone(), &config, gateway);

    http::serve(&config.server.bind_address(), state).await?;

    pool.close().await;
    info!("storefront stopped");
    Ok(())
}
