mod static_assets;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod api;
mod config;

use anyhow::Context;
use api::state::AppState;
use config::ServerConfig;
use std::sync::Arc;
use vitabot_ai::{ChatChain, ContextProvider, JsonLoader, OpenAIClientFactory};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting VitaBot server");

    let config = ServerConfig::load()?;

    if !config.context_path.exists() {
        tracing::warn!(
            path = %config.context_path.display(),
            "Context dataset not found; chat requests will fail until it exists"
        );
    }

    let loader = JsonLoader::dataset(&config.context_path);
    let context = ContextProvider::new(Arc::new(loader), config.context_reload);
    let chain = ChatChain::new(Arc::new(context))?.with_temperature(config.temperature);
    let llm = Arc::new(OpenAIClientFactory::new(config.model.clone()));

    tracing::info!(
        model = %config.model.model,
        context = %config.context_path.display(),
        reload = %config.context_reload,
        "Chat pipeline configured"
    );

    let app = api::router(AppState::new(chain, llm));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("VitaBot running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("VitaBot server stopped");
    Ok(())
}

/// `VITABOT_LOG_FORMAT=json` switches to one JSON object per line.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,vitabot_server=debug".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true);

    match std::env::var("VITABOT_LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
