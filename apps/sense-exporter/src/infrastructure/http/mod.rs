//! Scrape HTTP Endpoint
//!
//! Serves the exporter to Prometheus.
//!
//! # Endpoints
//!
//! - `/metrics` - runs a scrape and renders it in the text format (any method)
//! - `GET /` - small HTML index linking to `/metrics`
//! - `GET /healthz` - liveness check (simple OK)

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse},
    routing::{any, get},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::application::context::CollectContext;
use crate::application::scrape::Exporter;
use crate::infrastructure::metrics::{CONTENT_TYPE, render};

const INDEX: &str = r#"<!DOCTYPE html>
<html>
<head><title>Sense Exporter</title></head>
<body>
<h1>Sense Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
</body>
</html>
"#;

/// Build the router. Exposed for in-process tests.
pub fn router(exporter: Arc<Exporter>) -> Router {
    Router::new()
        .route("/metrics", any(metrics_handler))
        .route("/healthz", get(liveness_handler))
        .route("/", get(index_handler))
        .with_state(exporter)
}

// =============================================================================
// Metrics Server
// =============================================================================

/// HTTP server for the scrape endpoint.
pub struct MetricsServer {
    listen: SocketAddr,
    exporter: Arc<Exporter>,
    cancel: CancellationToken,
}

impl MetricsServer {
    /// Create a new metrics server.
    #[must_use]
    pub const fn new(listen: SocketAddr, exporter: Arc<Exporter>, cancel: CancellationToken) -> Self {
        Self {
            listen,
            exporter,
            cancel,
        }
    }

    /// Run the server until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), ServerError> {
        let app = router(self.exporter);

        let listener = TcpListener::bind(self.listen)
            .await
            .map_err(|e| ServerError::BindFailed(self.listen, e.to_string()))?;

        tracing::info!(addr = %self.listen, "Metrics server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| ServerError::ServerFailed(e.to_string()))?;

        tracing::info!("Metrics server stopped");
        Ok(())
    }
}

// =============================================================================
// HTTP Handlers
// =============================================================================

async fn metrics_handler(State(exporter): State<Arc<Exporter>>) -> impl IntoResponse {
    // Dropping the guard (request abandoned) cancels in-flight collections.
    let ctx = CollectContext::new(CancellationToken::new());
    let _guard = ctx.cancel_on_drop();

    let result = exporter.scrape(&ctx).await;
    let failed = result.failed_monitors();
    if failed > 0 {
        tracing::debug!(
            failed,
            monitors = result.monitors.len(),
            "Scrape completed with failed monitors"
        );
    }

    let body = render(&result, &exporter.describe());
    (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], body)
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX)
}

// =============================================================================
// Errors
// =============================================================================

/// Metrics server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind the listen address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(SocketAddr, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Tests
// =============================================================================
