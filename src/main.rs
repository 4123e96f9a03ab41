//! Panel Cache - cache service entry point
//!
//! Composition root: opens the shared store connection once, serves the
//! health, stats and invalidation endpoints, and closes the store on
//! shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use panel_cache::api::create_router;
use panel_cache::config::Backend;
use panel_cache::store::{KvStore, MemoryStore, RedisStore};
use panel_cache::{spawn_cleanup_task, AppState, CacheManager, Config};

/// Main entry point for the cache service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the configured store (Redis, or in-process with its sweep task)
/// 4. Start HTTP server on configured port
/// 5. On SIGINT/SIGTERM, drain requests and close the store
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "panel_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Panel Cache service");

    let config = Config::from_env();
    info!(
        "Configuration loaded: backend={:?}, ttl_list={}s, ttl_form={}s, ttl_dashboard={}s, ttl_session={}s, op_timeout={}ms, port={}",
        config.backend,
        config.ttl.list,
        config.ttl.form_data,
        config.ttl.dashboard,
        config.ttl.session,
        config.op_timeout_ms,
        config.server_port
    );

    let (store, sweeper) = open_store(&config).await?;
    let cache = CacheManager::new(store, config.op_timeout());
    info!(backend = cache.backend(), "Cache store ready");

    let app = create_router(AppState::new(cache.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(handle) = sweeper {
        handle.abort();
        warn!("Expiry sweep aborted");
    }
    cache.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Opens the configured backend. The in-process store also gets its sweep task.
async fn open_store(config: &Config) -> anyhow::Result<(Arc<dyn KvStore>, Option<JoinHandle<()>>)> {
    match config.backend {
        Backend::Redis => {
            let store = RedisStore::open(&config.redis)
                .await
                .context("failed to connect to Redis")?;
            Ok((Arc::new(store), None))
        }
        Backend::Memory => {
            let store = Arc::new(MemoryStore::new());
            let handle = spawn_cleanup_task(store.clone(), config.cleanup_interval);
            Ok((store, Some(handle)))
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
