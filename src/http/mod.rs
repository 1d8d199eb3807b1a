//! REST surface over the services.

mod error;
mod extract;
mod handlers;

pub use error::ErrorBody;
pub use extract::{Admin, PathParam, Payload, QueryParams};

use axum::http::{header, Method};
use axum::routing::get;
use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::payments::{PaymentGateway, PaymentService};
use crate::services::{AccountService, CatalogService, DashboardService, OrderService};
use crate::PostgresUnitOfWork;

/// Shared state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService<PostgresUnitOfWork>>,
    pub catalog: Arc<CatalogService<PostgresUnitOfWork>>,
    pub orders: Arc<OrderService<PostgresUnitOfWork>>,
    pub dashboard: Arc<DashboardService<PostgresUnitOfWork>>,
    pub payments: Arc<PaymentService>,
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config, gateway: Arc<dyn PaymentGateway>) -> Self {
        let uow = Arc::new(PostgresUnitOfWork::new(pool));
        let tokens = Arc::new(TokenIssuer::new(
            &config.auth.jwt_secret,
            config.auth.token_ttl_secs,
        ));

        Self {
            accounts: Arc::new(AccountService::new(uow.clone(), tokens.clone())),
            catalog: Arc::new(CatalogService::new(uow.clone())),
            orders: Arc::new(OrderService::new(uow.clone())),
            dashboard: Arc::new(DashboardService::new(uow)),
            payments: Arc::new(PaymentService::new(gateway, config.payments.clone())),
            tokens,
        }
    }
}

/// Build the axum router (separated for testing).
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/users", handlers::users::routes())
        .nest("/api/products", handlers::products::routes())
        .nest("/api/orders", handlers::orders::routes())
        .nest("/api/payments", handlers::payments::routes())
        .nest("/api/admin", handlers::admin::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves `state` on `address` until Ctrl-C.
pub async fn serve(address: &str, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    info!(address = %listener.local_addr()?, "storefront listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown requested");
}
