use axum::{
    routing::{get, post},
    Router,
};
use hd_core::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

pub mod error;
pub mod handlers;
pub mod state;
pub mod telegram;

pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/digest", post(handlers::run_digest))
        .route("/api/reactions", post(handlers::post_reaction))
        .route("/api/preferences", get(handlers::list_preferences))
        .route("/api/settings/:key", get(handlers::get_setting).put(handlers::put_setting))
        .route("/telegram/webhook", post(handlers::telegram_webhook))
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Serve until the state's shutdown handle fires.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let shutdown = state.shutdown.clone();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🌐 Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(async move { shutdown.triggered().await })
        .await?;
    Ok(())
}

pub mod prelude {
    pub use crate::{create_app, serve, AppState};
    pub use hd_core::{Error, Result};
}
