//! Axum router construction for the chart service.
//!
//! Assembles the `WebSocket` route and the static-content fallback into a
//! single [`Router`] with CORS enabled for the front-end dev server.

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::ServiceState;
use crate::ws;

/// Build the complete Axum router for the chart service.
///
/// The router includes:
/// - `GET /ws` -- `WebSocket` update-protocol endpoint
/// - everything else -- front-end assets served from `assets_dir`
///
/// CORS is configured to allow any origin for development. In production
/// this should be restricted.
pub fn build_router(state: Arc<ServiceState>, assets_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws::ws_endpoint))
        .fallback_service(ServeDir::new(assets_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
