//! Cyber range training coordinator.
//!
//! Run with: cargo run -p coordinator-demo
//!
//! Set `CYRANGE_CONFIG` to a TOML file to override the defaults, then post
//! form requests to the listen address (default `0.0.0.0:8082`).

use std::sync::Arc;

use anyhow::Context;
use cyrange_collab::HttpCollaborator;
use cyrange_core::CoordinatorConfig;
use cyrange_session::{SessionStore, TrainingManager, storage::JsonFileStorage};
use cyrange_transport::{AcceptAnyPassword, Coordinator, http::create_router};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = CoordinatorConfig::from_env().context("loading coordinator configuration")?;

    let timeout = config.request_timeout();
    let content = HttpCollaborator::new(&config.content_server_url, timeout)
        .context("building content collaborator client")?;
    let range = HttpCollaborator::new(&config.range_server_url, timeout)
        .context("building range collaborator client")?;

    let active = SessionStore::new(JsonFileStorage::new(&config.active_sessions_file));
    let saved = SessionStore::new(JsonFileStorage::new(&config.saved_configurations_file));

    if config.require_password {
        tracing::warn!("Password checks use the development verifier and accept any password");
    }

    let addr = config.listen_addr;
    tracing::info!(
        content = %config.content_server_url,
        range = %config.range_server_url,
        max_sessions = config.max_sessions,
        database = %config.database_dir.display(),
        "Coordinator configured"
    );

    let manager = TrainingManager::new(config, active, saved, content, range);
    let app = create_router(Arc::new(Coordinator::new(manager, AcceptAnyPassword)));

    // Start server
    tracing::info!("Coordinator listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app).await.context("serving requests")?;
    Ok(())
}
