//! HTTP server startup.
//!
//! [`serve_http`] opens the vault, builds the dispatcher, and runs the gateway
//! until ctrl-c.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::NoteportConfig;
use crate::dataview::engine::MetadataQueryEngine;
use crate::dataview::QueryEngine;
use crate::rpc::dispatch::Dispatcher;
use crate::rpc::gateway::{self, AppState};
use crate::tools::NoteTools;
use crate::vault::fs::FsVault;
use crate::vault::DocumentStore;

/// Open the configured vault and wire up the tool handler.
pub fn build_tools(config: &NoteportConfig) -> Result<NoteTools> {
    let vault_path = config.resolved_vault_path();
    let vault = FsVault::open(vault_path.clone(), Some(config.vault.name.clone()))
        .with_context(|| format!("failed to open vault at {}", vault_path.display()))?;

    let store: Arc<dyn DocumentStore> = Arc::new(vault);
    let query_engine: Option<Arc<dyn QueryEngine>> = if config.dataview.enabled {
        Some(Arc::new(MetadataQueryEngine::new(store.clone())))
    } else {
        tracing::info!("dataview queries disabled");
        None
    };

    Ok(NoteTools::new(store, query_engine, config.patch_options()))
}

/// Start the JSON-RPC gateway over HTTP.
pub async fn serve_http(config: NoteportConfig) -> Result<()> {
    anyhow::ensure!(
        !config.server.api_key.is_empty(),
        "no API key configured: set server.api_key or NOTEPORT_API_KEY"
    );

    let bind_addr = config.bind_addr();
    let tools = build_tools(&config)?;
    let state = AppState::new(&config, Dispatcher::new(tools));
    let router = gateway::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(
        addr = %bind_addr,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        "noteport listening at http://{bind_addr}/rpc"
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        tracing::info!("shutting down HTTP server");
    })
    .await?;

    Ok(())
}
