/// Server setup and initialization
///
/// Wires together all components: storage, access control, the
/// current-version registry, the comparison orchestrator and the HTTP
/// routes. Provides the main application factory function for creating the
/// Axum app.

use crate::{
    access::SqliteAccessControl,
    api::{
        compare::create_compare_routes,
        flows::{create_flow_routes, AppState},
    },
    compare::ComparisonOrchestrator,
    config::Config,
    flow::{manager::FlowVersionManager, registry::CurrentVersionRegistry, store::SqliteVersionStore},
    runtime::executor::HttpGraphExecutor,
};
use anyhow::Result;
use axum::{routing::get, Router};
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Create the main Axum application with all routes
///
/// Initializes all components and wires them together into a complete
/// application: database pool, schemas, registry warm-up, manager and
/// orchestrator, and the HTTP routes on top.
pub async fn create_app(config: Config) -> Result<Router> {
    tracing::info!("🗄️ Connecting to database: {}", config.database.url);
    let pool = SqlitePool::connect(&config.database.url).await?;

    tracing::info!("📋 Initializing flow storage schema");
    let store = Arc::new(SqliteVersionStore::new(pool.clone()));
    store.init_schema().await?;

    tracing::info!("🔑 Initializing access control schema");
    let access = Arc::new(SqliteAccessControl::new(pool));
    access.init_schema().await?;

    tracing::info!("📥 Loading current versions into the registry");
    let registry = Arc::new(CurrentVersionRegistry::new(Arc::clone(&store)));
    registry.init_from_store().await?;

    let manager = Arc::new(FlowVersionManager::new(
        Arc::clone(&store),
        Arc::clone(&access),
        Arc::clone(&registry),
    ));

    tracing::info!("⚙️ Initializing graph executor client: {}", config.compare.engine_url);
    let executor = Arc::new(HttpGraphExecutor::new(config.compare.engine_url.clone()));
    let orchestrator = Arc::new(ComparisonOrchestrator::new(
        store,
        executor,
        config.compare.history_window,
        config.compare.max_concurrency,
    ));

    let app_state = AppState {
        manager,
        orchestrator,
    };

    tracing::info!("📡 Creating HTTP router with all endpoints");
    let app = Router::new()
        // Health check endpoint
        .route("/healthz", get(health_check))
        // Version lifecycle management API routes
        .merge(create_flow_routes().with_state(app_state.clone()))
        // Batch comparison route
        .merge(create_compare_routes().with_state(app_state));

    tracing::info!("✅ Application initialized successfully");

    Ok(app)
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting flowver server...");

    // Create the application
    let app = create_app(config.clone()).await?;

    // Bind to the configured address
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    // Start the server
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}
