use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use courier_api::config::ServerConfig;
use courier_api::router::build_app_router;
use courier_api::state::{AppState, Transports};
use courier_events::{EngineConfig, PlatformEvent, ReportScheduler};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "courier_api=debug,courier_events=debug,tower_http=debug".into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let engine_config = EngineConfig::from_env();
    tracing::info!(
        zone = ?engine_config.reference_zone,
        mode = ?engine_config.verification_mode,
        "Loaded engine configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = courier_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    courier_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    courier_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- App state ---
    let transports = Transports::from_env();
    let state = AppState::new(pool, config.clone(), &engine_config, transports);

    // Trace every bus event so dispatch outcomes show up in the logs.
    let event_log_handle = tokio::spawn(log_events(state.event_bus.subscribe()));

    // --- Report scheduler ---
    let scheduler_cancel = CancellationToken::new();
    let scheduler = ReportScheduler::new(
        Arc::clone(&state.report_engine),
        engine_config.report_check_interval,
    )
    .with_digest(Arc::clone(&state.digest));
    let cancel = scheduler_cancel.clone();
    let scheduler_handle = tokio::spawn(async move {
        scheduler.run(cancel).await;
    });

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    let drain = Duration::from_secs(config.shutdown_timeout_secs);

    // A report run in progress finishes its current item before the loop exits.
    scheduler_cancel.cancel();
    if tokio::time::timeout(drain, scheduler_handle).await.is_err() {
        tracing::warn!("Report scheduler did not stop within the shutdown timeout");
    }
    tracing::info!("Report scheduler stopped");

    event_log_handle.abort();
    tracing::info!("Graceful shutdown complete");
}

async fn log_events(mut rx: tokio::sync::broadcast::Receiver<PlatformEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                tracing::debug!(
                    event_type = %event.event_type,
                    merchant_id = ?event.merchant_id,
                    source = ?event.source_entity_type,
                    source_id = ?event.source_entity_id,
                    "Event published"
                );
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event log lagged behind the bus");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
