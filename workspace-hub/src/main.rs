use anyhow::Result;
use axum::{routing::get, Router};
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use workspace_hub::{
    api,
    config::{Cli, Config},
};
use workspace_hub_core::{
    DocumentStore, FsDocumentStore, MemoryDocumentStore, ProjectRegistry, WorkspaceStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load(Cli::parse())?;

    let (docs, projects): (Arc<dyn DocumentStore>, Arc<ProjectRegistry>) = if config.in_memory {
        info!("Keeping projects and workspaces in memory");
        (
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(ProjectRegistry::in_memory()),
        )
    } else {
        info!("Using data directory {}", config.data_dir.display());
        (
            Arc::new(FsDocumentStore::new(config.workspaces_dir())?),
            Arc::new(ProjectRegistry::open(&config.data_dir)?),
        )
    };
    let store = Arc::new(WorkspaceStore::new(docs, projects.clone()));

    let mut events = store.events().subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => debug!("workspace event: {:?}", event),
                Err(RecvError::Lagged(skipped)) => warn!("event log skipped {} events", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let app = Router::new()
        .merge(api::router(store, projects))
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = TcpListener::bind(config.addr).await?;
    info!("Listening on {}", config.addr);
    axum::serve(listener, app).await?;
    Ok(())
}
