//! REST API serving solar predictions from the loaded model.
//!
//! Endpoints:
//! - `POST /predict`: peak power for one set of conditions
//! - `POST /predict/summary`: peak plus hourly curve, energy totals and advice
//! - `GET /metadata`: training provenance of the loaded model
//! - `GET /cities`: cities the model has a one-hot slot for

mod handlers;
pub mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::features::UnknownCityPolicy;
use crate::predictor::LoadedModel;

/// Immutable application state shared across all request handlers.
///
/// Built once at startup and wrapped in `Arc`. The model is only read, so
/// no locks are needed.
pub struct AppState {
    /// Predictor, metadata and feature schema.
    pub model: LoadedModel,
    /// Handling of cities without a one-hot slot.
    pub policy: UnknownCityPolicy,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/predict", post(handlers::predict))
        .route("/predict/summary", post(handlers::predict_summary))
        .route("/metadata", get(handlers::get_metadata))
        .route("/cities", get(handlers::get_cities))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the given browser origins. Origins that are not valid header
/// values are skipped with a warning.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Binds to the given address and serves the API until the process ends.
///
/// # Errors
///
/// Returns an I/O error if the listener cannot bind or the server fails.
pub async fn serve(
    state: Arc<AppState>,
    addr: SocketAddr,
    cors_origins: &[String],
) -> std::io::Result<()> {
    let app = router(state).layer(cors_layer(cors_origins));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
