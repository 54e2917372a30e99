use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storage_coordinator::{
    api,
    config::{Config, ReplicaBackend, ReplicationConfig},
    coordinator::ReplicationError,
    object_store as obj,
    storage::Database,
    strategies::ReplicaTarget,
    AppState,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    match log_format.to_lowercase().as_str() {
        "gcp" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_stackdriver::layer())
                .init();
        }
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_list(false),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    info!(version = env!("CARGO_PKG_VERSION"), "storage-coordinator starting");

    // Load configuration
    let config = Config::load()?;

    std::fs::create_dir_all(&config.storage.root)?;
    std::fs::create_dir_all(&config.storage.staging_dir)?;
    info!(
        "Storing files under: {} ({:?} layout)",
        config.storage.root, config.storage.layout
    );

    // Initialize replica targets
    let targets = open_replica_targets(&config.replication)?;

    // Initialize database
    let db = Database::open(&config.node.data_dir)?
        .with_default_importance(config.replication.default_importance)
        .with_replica_limit(targets.len());
    info!("Database opened at: {}", config.node.data_dir);

    // Create shared state
    let state = Arc::new(AppState::new(config.clone(), db, targets));

    // Start the replication scheduler
    let scheduler = (config.replication.interval_seconds > 0).then(|| {
        tokio::spawn(run_replication(
            Arc::clone(&state),
            Duration::from_secs(config.replication.interval_seconds),
        ))
    });

    // Build and start the HTTP server
    let app = api::create_router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(&config.node.bind_address).await?;
    info!("Listening on: {}", config.node.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Cleanup: abort background tasks
    if let Some(handle) = scheduler {
        info!("Stopping replication scheduler");
        handle.abort();
    }

    info!("Shutdown complete");
    Ok(())
}

fn open_replica_targets(config: &ReplicationConfig) -> anyhow::Result<Vec<ReplicaTarget>> {
    let mut targets = Vec::with_capacity(config.targets.len());

    for target in &config.targets {
        let store: Arc<dyn obj::ObjectStore> = match target.backend {
            ReplicaBackend::Local(ref path) => {
                info!(
                    storage_id = target.storage_id,
                    location_id = target.location_id,
                    "Using local replica target at: {}",
                    path
                );
                Arc::new(obj::LocalStore::new(path)?)
            }
            ReplicaBackend::Http(ref url) => {
                info!(
                    storage_id = target.storage_id,
                    location_id = target.location_id,
                    "Using HTTP replica target at: {}",
                    url
                );
                Arc::new(obj::HttpStore::new(url, config.token.as_deref())?)
            }
        };
        targets.push(ReplicaTarget::new(
            target.storage_id,
            target.location_id,
            store,
        ));
    }

    Ok(targets)
}

/// Replicate one file per tick until aborted. Failures are logged and
/// retried on a later tick.
async fn run_replication(state: Arc<AppState>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        match state.replication.replicate_one().await {
            Ok(summary) => info!(
                file_id = summary.file_id,
                replica_id = summary.replica_id,
                storage_id = summary.result.storage_id,
                location_id = summary.result.location_id,
                "Replicated file"
            ),
            Err(ReplicationError::NoFileNeedsReplication) => {
                tracing::debug!("No file needs replication");
            }
            Err(e) => tracing::warn!(error = %e, "Replication pass failed"),
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
