//! Integration tests for the chart service router.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. This validates routing and static-content
//! serving without needing a live network connection.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use plotline_server::{ServiceState, build_router};
use tower::ServiceExt;

fn make_router(assets_dir: &std::path::Path) -> axum::Router {
    let state = Arc::new(ServiceState::new("test-token"));
    build_router(state, assets_dir)
}

#[tokio::test]
async fn serves_front_end_assets() {
    let assets = tempfile::tempdir().unwrap();
    std::fs::write(assets.path().join("index.html"), "<html>chart</html>").unwrap();
    let router = make_router(assets.path());

    let response = router
        .oneshot(
            Request::builder()
                .uri("/index.html")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_assets_are_not_found() {
    let assets = tempfile::tempdir().unwrap();
    let router = make_router(assets.path());

    let response = router
        .oneshot(
            Request::builder()
                .uri("/missing.js")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ws_route_requires_an_upgrade() {
    let assets = tempfile::tempdir().unwrap();
    let router = make_router(assets.path());

    // A plain GET without upgrade headers is rejected, not routed to the
    // static fallback.
    let response = router
        .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_ne!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.status().is_client_error());
}
