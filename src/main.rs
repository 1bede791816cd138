use extension_registry::{
    api::{build_router, AppState},
    config::Config,
    registry::InMemoryRegistry,
    scheduler::{tasks, SchedulerService},
    search::SearchService,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration; a broken configuration is startup-fatal
    let config = Config::load()?;

    // Initialize tracing
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));
    if config.observability.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        service = %config.observability.service_name,
        version = env!("CARGO_PKG_VERSION"),
        "Starting extension registry"
    );
    tracing::info!(backend = ?config.search.backend, enabled = config.search.enabled, "Search configuration");

    // Initialize the extension registry store
    let registry = Arc::new(InMemoryRegistry::new());

    // Initialize the search facade; backend misconfiguration surfaces here,
    // before the server accepts traffic
    let search = Arc::new(SearchService::new(config.search.clone(), registry.clone())?);
    search.init().await.map_err(|e| {
        tracing::error!(error = %e, "Search index initialization failed");
        e
    })?;
    tracing::info!(engine_backed = search.is_enabled(), "Search service initialized");

    // Start the scheduler with the daily index maintenance job
    let mut scheduler = SchedulerService::new(config.scheduler.clone()).await?;
    tasks::register_search_index_update(&scheduler, &config.scheduler, search.clone()).await?;
    scheduler.start().await?;

    // Serve the API
    let state = AppState::new(registry, search);
    let app = build_router(state);
    let address = format!("{}:{}", config.server.host, config.server.http_port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "HTTP server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
