//! HTTP API server with observability for order processing.
//!
//! Provides REST endpoints for creating, reading, listing and cancelling
//! orders, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use orchestration::{
    HttpMemberValidator, HttpPaymentGateway, HttpProductValidator, OrchestrationError,
    OrderPorts, OrderService, SandboxMemberValidator, SandboxPaymentGateway,
    SandboxProductValidator,
};
use order_store::{InMemoryOrderRepository, OrderRepository, PostgresOrderRepository};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::orders::AppState;

/// Errors that prevent the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to connect to database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to run migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("failed to build service client: {0}")]
    Client(#[from] OrchestrationError),
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/api/orders",
            get(routes::orders::list).post(routes::orders::create),
        )
        .route(
            "/api/orders/{id}",
            get(routes::orders::get).put(routes::orders::update),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(axum::middleware::from_fn(error::attach_path))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires an order service over the sandbox adapters.
pub fn sandbox_service(repository: Arc<dyn OrderRepository>, call_timeout: Duration) -> OrderService {
    OrderService::new(
        OrderPorts {
            repository,
            members: Arc::new(SandboxMemberValidator),
            products: Arc::new(SandboxProductValidator),
            payments: Arc::new(SandboxPaymentGateway::new()),
        },
        call_timeout,
    )
}

/// Builds the application state described by `config`.
///
/// Connects to PostgreSQL and runs migrations when `DATABASE_URL` is set,
/// otherwise keeps orders in memory. Uses the sandbox adapters unless
/// external services are explicitly enabled.
pub async fn create_state(config: &Config) -> Result<Arc<AppState>, StartupError> {
    let repository: Arc<dyn OrderRepository> = match &config.database_url {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await?;
            let repository = PostgresOrderRepository::new(pool);
            repository.run_migrations().await?;
            tracing::info!("using PostgreSQL order repository");
            Arc::new(repository)
        }
        None => {
            tracing::info!("DATABASE_URL not set, keeping orders in memory");
            Arc::new(InMemoryOrderRepository::new())
        }
    };

    let timeout = config.external_service_timeout;
    let orders = if config.external_services_mock {
        tracing::info!("using sandbox member, product and payment services");
        sandbox_service(repository, timeout)
    } else {
        tracing::info!(
            member = %config.member_service_url,
            product = %config.product_service_url,
            payment = %config.payment_service_url,
            "using HTTP member, product and payment services"
        );
        OrderService::new(
            OrderPorts {
                repository,
                members: Arc::new(HttpMemberValidator::new(
                    config.member_service_url.clone(),
                    timeout,
                )?),
                products: Arc::new(HttpProductValidator::new(
                    config.product_service_url.clone(),
                    timeout,
                )?),
                payments: Arc::new(HttpPaymentGateway::new(
                    config.payment_service_url.clone(),
                    timeout,
                )?),
            },
            timeout,
        )
    };

    Ok(Arc::new(AppState { orders }))
}
