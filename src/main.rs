use cms_search::{
    api::{build_router, AppState},
    config::Config,
    engine::{SearchEngine, SolrClient},
    indexing::{ActionQueue, IndexSynchronizer, IndexerRegistry},
    registry::Registries,
    scheduler::{indexing_jobs, init_scheduler_metrics, SchedulerService},
    search::SearchService,
    state::create_store,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("cms_search={},tower_http=info", config.observability.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.observability.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(
        service = %config.observability.service_name,
        site = %config.site.name,
        "Starting cms-search v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Initialize Prometheus metrics
    if config.observability.prometheus_enabled {
        if let Err(e) = cms_search::metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
        }
        init_scheduler_metrics();
    } else {
        tracing::info!("Prometheus metrics disabled in configuration");
    }

    // Storage backend
    tracing::info!("Storage backend: {:?}", config.state.backend);
    let store = create_store(&config.state).await?;

    // Indexers are supplied by the embedding CMS; the standalone service starts with none
    let indexers = Arc::new(IndexerRegistry::new());
    if indexers.is_empty() {
        tracing::warn!(
            auto_full_rebuild = config.indexing.auto_full_rebuild,
            "No indexers registered: runs will only clear the site, and a full rebuild discards every queued action"
        );
    }

    // Field catalog, seeded with the fields indexers contribute
    let registries = Arc::new(Registries::load(store.clone()).await?);
    let added = registries
        .fields
        .update_fields(&indexers.additional_fields())
        .await?;
    if added > 0 {
        registries.reload().await?;
    }
    tracing::info!(
        fields = registries.fields.field_list().len(),
        intersections = registries.intersections.intersections().len(),
        "Registries loaded"
    );

    // Engine client
    let engine: Arc<dyn SearchEngine> = Arc::new(SolrClient::from_config(&config.engine)?);
    tracing::info!(url = %config.engine.url, "Engine client initialized");

    let search = Arc::new(SearchService::new(
        engine.clone(),
        registries.clone(),
        config.search.clone(),
    ));

    let synchronizer = Arc::new(IndexSynchronizer::new(
        engine,
        ActionQueue::new(store.clone()),
        indexers,
        config.site.name.clone(),
        config.indexing.clone(),
    ));

    // Background indexing
    let mut scheduler = SchedulerService::new(config.scheduler.clone()).await?;
    if config.scheduler.enabled {
        for job in indexing_jobs(&config.scheduler.jobs, synchronizer.clone()) {
            scheduler.add_job(job).await?;
        }
    }
    scheduler.start().await?;

    let state = AppState::new(store, registries, search, synchronizer);
    let app = build_router(state).layer(TimeoutLayer::new(Duration::from_secs(
        config.server.request_timeout_secs,
    )));

    let http_addr = format!("{}:{}", config.server.host, config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_addr).await?;

    tracing::info!("HTTP API server listening on http://{}", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("   Search: http://{}/v1/search", http_addr);

    let http_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(http_listener, app).await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    tokio::select! {
        _ = http_handle => {
            tracing::warn!("HTTP server stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    tracing::info!("Shutting down gracefully...");
    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!("Scheduler shutdown failed: {}", e);
    }
    Ok(())
}
