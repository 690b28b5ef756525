//! # Decipher Node
//!
//! HTTP API over the notebook lifecycle: session-scoped notebook routes,
//! derived artifact triggers, chat forwarding, uploads and the worker
//! write-back routes.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;
pub mod storage;

pub use config::NodeConfig;
pub use state::AppState;

/// Multipart framing allowance on top of the file size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Run the node until the server stops.
pub async fn run_server(config: NodeConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr;
    let state = AppState::new(config)?;
    let app = create_router(state);

    info!("listening on http://{}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let upload_limit = state.config.limits.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;
    let files = ServeDir::new(&state.config.storage.root);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))

        // Notebooks
        .route(
            "/api/notebooks",
            get(api::notebooks::list_notebooks).post(api::notebooks::create_notebook),
        )
        .route(
            "/api/notebooks/:id",
            get(api::notebooks::get_notebook).delete(api::notebooks::delete_notebook),
        )
        .route("/api/notebooks/:id/sources", patch(api::notebooks::update_sources))
        .route("/api/notebooks/:id/retry", post(api::notebooks::retry_notebook))

        // Derived artifacts
        .route("/api/notebooks/:id/mindmap", post(api::artifacts::generate_mindmap))
        .route(
            "/api/notebooks/:id/audio-overview",
            post(api::artifacts::generate_audio_overview),
        )

        // Chat and uploads
        .route("/api/chat", post(api::chat::chat))
        .route(
            "/api/upload",
            post(api::upload::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Uploaded objects, addressed by their storage key
        .nest_service("/files", files)

        // Worker write-back
        .route("/internal/notebooks/:id/status", put(api::internal::report_status))
        .route("/internal/notebooks/:id/output", put(api::internal::report_output))
        .route(
            "/internal/notebooks/:id/artifacts/:kind",
            put(api::internal::report_artifact),
        )

        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
