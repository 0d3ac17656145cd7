//! Nile Chat server

use nile_chat::api::{create_router, AppState};
use nile_chat::chat::ChatSession;
use nile_chat::config::ChatConfig;
use nile_chat::llm::{LocalModelService, LoggingService};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nile_chat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    tracing::info!("Starting up Nile Chat");

    let config = ChatConfig::from_env();
    let model_id = config.resolve_model_id()?;

    let local = LocalModelService::new(&config.llm_url, model_id, config.llm_timeout)?;
    tracing::info!(
        endpoint = %local.endpoint(),
        timeout_secs = config.llm_timeout.as_secs(),
        "Inference provider configured"
    );
    let llm = Arc::new(LoggingService::new(Arc::new(local)));

    let session = ChatSession::new(llm, config.session_options());
    tracing::info!(model = %session.model_id(), "Chat session ready");

    let state = AppState::new(session);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Nile Chat server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
