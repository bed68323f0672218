//! Serve command - Starts the HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::api::{create_router, AppState};
use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{
    CounterStore, Database, MemoryCounterStore, RedisCounterStore, SystemClock,
};

/// Execute the serve command
pub async fn execute(args: ServeArgs, config: Config) -> AppResult<()> {
    tracing::info!("Starting server...");

    // Initialize database (runs pending migrations)
    let db = Arc::new(Database::connect(&config).await?);

    // Login throttle counters: Redis when configured, in-process otherwise
    let counter_store: Arc<dyn CounterStore> = match config.redis_url.as_deref() {
        Some(url) => {
            let store = RedisCounterStore::connect(url)
                .await
                .map_err(|e| AppError::internal(format!("Redis connection failed: {}", e)))?;
            Arc::new(store)
        }
        None => {
            tracing::warn!(
                "REDIS_URL not set; login throttling uses an in-process store \
                 and is not shared across instances"
            );
            Arc::new(MemoryCounterStore::new(Arc::new(SystemClock)))
        }
    };

    // Create application state wiring services together
    let app_state = AppState::from_config(db, counter_store, &config);

    // Build router
    let app = create_router(app_state);

    // Start server
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    // ConnectInfo provides the peer address for client identification
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    Ok(())
}
