//! HTTP server built on axum.
//!
//! `POST /compare` runs the comparison pipeline and answers with an HTML
//! fragment; any other method on that path gets a plain-text 405. `GET
//! /health` reports whether a provider is configured.

use crate::error::ServiceError;
use crate::service::ComparisonService;
use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::header,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared handle to the service; the only state requests share.
pub type SharedService = Arc<ComparisonService>;

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.public_message(),
        )
            .into_response()
    }
}

/// Build the router with `/compare` and `/health` routes.
pub fn router(service: SharedService) -> Router {
    Router::new()
        .route(
            "/compare",
            post(compare_handler).fallback(method_not_allowed_handler),
        )
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn compare_handler(
    State(service): State<SharedService>,
    body: Bytes,
) -> Result<Html<String>, ServiceError> {
    service.compare(&body).await.map(Html)
}

async fn method_not_allowed_handler() -> ServiceError {
    ServiceError::MethodNotAllowed
}

/// Health check endpoint.
async fn health_handler(State(service): State<SharedService>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "provider_configured": service.provider_configured(),
        "model": service.model(),
    });
    axum::Json(body)
}

/// Serve on `addr` until Ctrl-C.
pub async fn run(service: SharedService, addr: &str) -> Result<(), std::io::Error> {
    let app = router(service);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Comparison service listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
}
