//! # Regimen Node
//!
//! Serves one Regimen session: catalog browsing, the persisted product
//! selection, and the routine/chat conversation.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod api;
mod config;
mod state;

use config::NodeConfig;
use state::AppState;

/// Run the Regimen node server.
pub async fn run_server(config: NodeConfig) -> anyhow::Result<()> {
    info!("🚀 Regimen node starting...");

    let state = AppState::from_config(&config).await?;
    let app = create_router(state);

    info!("🌐 Listening on http://{}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the API router.
fn create_router(state: AppState) -> Router {
    // CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))

        // Catalog
        .route("/api/v1/catalog", get(api::catalog::get_catalog))

        // Selection
        .route(
            "/api/v1/selection",
            get(api::selection::get_selection)
                .post(api::selection::toggle_product)
                .delete(api::selection::clear_selection),
        )
        .route("/api/v1/selection/:id", delete(api::selection::remove_product))

        // Routine and chat
        .route("/api/v1/routine", post(api::chat::generate_routine))
        .route("/api/v1/chat", post(api::chat::ask_question))
        .route("/api/v1/conversation", get(api::chat::get_conversation))

        // WebSocket endpoints
        .route("/ws/session", get(api::ws::session_stream))

        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = NodeConfig::from_env()?;
    run_server(config).await
}
