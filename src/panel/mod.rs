//! Control panel — Axum web server for operating the engine.
//!
//! Serves a REST API and a self-contained HTML panel.
//! CORS enabled for local development.

pub mod routes;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue, Method},
    response::Html,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use routes::AppState;

/// The embedded panel HTML (compiled into the binary).
const PANEL_HTML: &str = include_str!("templates/index.html");

/// Start the panel web server.
///
/// This spawns a background task — it doesn't block.
pub fn spawn_panel(state: AppState, port: u16) -> Result<()> {
    let app = build_router(state);

    tokio::spawn(async move {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        info!(port, "Control panel starting on http://localhost:{port}");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("Failed to bind panel port");

        axum::serve(listener, app)
            .await
            .expect("Panel server error");
    });

    Ok(())
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin("*".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        // API routes
        .route("/api/config", get(routes::get_config))
        .route("/api/start", post(routes::post_start))
        .route("/api/stop", post(routes::post_stop))
        .route("/api/command", post(routes::post_command))
        .route("/api/status", get(routes::get_status))
        .route("/api/logs", get(routes::get_logs))
        .route("/api/tick", post(routes::post_tick))
        .route("/health", get(routes::health))
        // Panel HTML
        .route("/", get(serve_panel))
        .layer(cors)
        .with_state(state)
}

/// Serve the embedded HTML panel.
async fn serve_panel() -> Html<&'static str> {
    Html(PANEL_HTML)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
