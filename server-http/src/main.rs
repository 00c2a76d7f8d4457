use argent::planes::control::AdminOperations;
use server_http::{AppState, build_router};
use shared::config::Config;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Argent HTTP Server...");

    // Load environment variables from .env file (if exists)
    match dotenvy::dotenv() {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    // Load configuration from environment variables
    let config = Config::from_env();
    let bind_address = config.bind_address();
    let prune_interval = config.cache.prune_interval;
    info!("Environment: {}", config.environment.as_str());

    let state = AppState::from_config(config).expect("Failed to initialize market providers");

    // Background expiry sweep, stopped on shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let pruner = tokio::spawn(prune_loop(state.clone(), prune_interval, shutdown_rx));

    // Build router
    let router = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .expect("Failed to bind HTTP listener");

    info!("HTTP Server listening on http://{}", bind_address);
    info!("Try: curl http://{}/api/market/price/BTC", bind_address);

    // Graceful shutdown handler
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server error");

    let _ = shutdown_tx.send(true);
    let _ = pruner.await;
    info!("Server shutdown complete.");
}

async fn prune_loop(state: AppState, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(interval.max(Duration::from_secs(1)));
    // First tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = state.admin.prune_cache();
                if removed > 0 {
                    debug!("Background prune removed {} expired entries", removed);
                }
            }
            _ = shutdown.changed() => {
                info!("Stopping background cache pruning");
                break;
            }
        }
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Shutting down gracefully...");
}
