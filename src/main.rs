use http::header;
use splitledger::{
    api::{
        handlers::{AppState, api_routes},
        openapi::ApiDoc,
    },
    config::CONFIG,
    core::{
        balance_cache::BalanceCache,
        balance_service::BalanceService,
        services::{LedgerService, ProducerSettings},
    },
    infrastructure::{
        cache::in_memory::InMemoryCache, logging::in_memory::InMemoryLogging, queue::in_memory::InMemoryQueue,
        storage::in_memory::InMemoryStorage,
    },
    worker::ExpenseWorker,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&CONFIG.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    info!(config = ?*CONFIG, "starting splitledger");

    // Collaborators shared by the API and every worker
    let storage = InMemoryStorage::new();
    let cache = InMemoryCache::new();
    let queue = InMemoryQueue::new();
    let logging = InMemoryLogging::new();
    let timeouts = CONFIG.timeouts();

    let balance_service = |cache: InMemoryCache| {
        BalanceService::new(
            storage.clone(),
            BalanceCache::new(cache, CONFIG.cache_ttl(), timeouts.cache),
            timeouts,
        )
    };

    let producer = ProducerSettings {
        publish_attempts: CONFIG.publish_attempts,
        ..ProducerSettings::new(CONFIG.expense_queue.clone())
    };
    let ledger = LedgerService::new(storage.clone(), logging.clone(), queue.clone(), producer, timeouts);
    ledger.init().await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut workers = Vec::with_capacity(CONFIG.worker_count);
    for id in 0..CONFIG.worker_count {
        let worker = ExpenseWorker::new(
            id,
            queue.clone(),
            balance_service(cache.clone()),
            logging.clone(),
            CONFIG.worker_settings(),
        );
        let shutdown = shutdown_rx.clone();
        workers.push(tokio::spawn(async move { worker.run(shutdown).await }));
    }

    let state = Arc::new(AppState {
        ledger,
        balances: balance_service(cache.clone()),
    });

    let app = api_routes(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([http::Method::GET, http::Method::POST])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], CONFIG.port));
    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
            }
            info!("shutdown requested");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    for result in futures::future::join_all(workers).await {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "worker exited with error"),
            Err(e) => error!(error = %e, "worker task panicked"),
        }
    }
    info!("shutdown complete");
    Ok(())
}
