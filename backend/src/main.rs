//! Agri Trade Console - Settlement Server
//!
//! Settles confirmed purchase and sales orders for paddy, wheat and maize,
//! and hands the frozen figures to the order store.

use axum::{routing::get, Router};
use std::{net::SocketAddr, sync::Arc};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod external;
mod handlers;
mod routes;
mod services;

pub use config::Config;
use external::OrderStoreClient;
use services::{ReportingService, RetryPolicy, SettlementService};
use shared::SettlementCalculator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub settlements: SettlementService<OrderStoreClient>,
    pub reporting: ReportingService,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "agri_settle_server=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.uses_json_logs() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Agri settlement server");
    tracing::info!("Environment: {}", config.environment);

    let table = config.deduction_table()?;
    tracing::info!(rules = table.rules().len(), "Deduction table loaded");
    let calculator = Arc::new(SettlementCalculator::new(table));

    let store = OrderStoreClient::new(&config.persistence)?;
    tracing::info!("Order store: {}", config.persistence.base_url);

    // Create application state
    let state = AppState {
        settlements: SettlementService::new(
            calculator.clone(),
            store,
            RetryPolicy::from(&config.persistence),
        ),
        reporting: ReportingService::new(calculator),
        config: Arc::new(config.clone()),
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Agri Trade Console Settlement API v1.0"
}
