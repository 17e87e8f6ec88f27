//! HTTP adapter around the analysis pipeline
//!
//! Enabled with the `server` feature. Uploads are spilled to a temporary file,
//! decoded, analysed on the blocking pool and answered with the estimate as
//! JSON. Failures are reported as `{ "detail": "..." }`.

pub mod config;
pub mod error;
pub mod routes;
pub mod upload;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::AppState;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the application router
pub fn make_app(config: &ServerConfig) -> Router {
    let state = AppState::new(config.analysis_config());

    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .route("/detect-bpm", post(routes::detect_bpm))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.body_limit_bytes()))
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process is stopped
pub async fn run_server(config: ServerConfig) -> Result<()> {
    config.analysis_config().validate()?;
    let app = make_app(&config);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("BPM Detection API listening on {}", address);

    Ok(axum::serve(listener, app).await?)
}
