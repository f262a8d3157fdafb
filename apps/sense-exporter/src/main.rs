//! Sense Exporter Binary
//!
//! Authenticates against Sense and serves `/metrics`.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin sense-exporter
//! ```
//!
//! # Environment Variables
//!
//! ## Accounts (at least one)
//! - `SENSE_EMAIL`: Sense account e-mail
//! - `SENSE_PASSWORD` or `SENSE_PASSWORD_FILE`: password, or a file whose
//!   first line is the password
//! - `SENSE_CONFIG`: JSON accounts file, one entry per account
//!
//! ## Optional
//! - `SENSE_EXPORTER_LISTEN`: listen address, e.g. `:9553` or `127.0.0.1:9553`
//! - `SENSE_EXPORTER_PORT`: HTTP listen port when no address is set (default: 9553)
//! - `SENSE_EXPORTER_TIMEOUT_SECS`: per-collection timeout, 0 disables (default: 10)
//! - `SENSE_API_URL`: REST base URL
//! - `SENSE_REALTIME_URL`: realtime feed base URL
//! - `OTEL_ENABLED`: Enable OpenTelemetry (default: false)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint, enables export when set
//! - `OTEL_SERVICE_NAME`: Service name (default: sense-exporter)
//! - `RUST_LOG`: Log level (default: `sense_exporter=info`)

use std::sync::Arc;

use sense_exporter::infrastructure::metrics::{ProcessCollector, RuntimeCollector};
use sense_exporter::infrastructure::sense::connect_all;
use sense_exporter::infrastructure::telemetry;
use sense_exporter::{Exporter, ExporterConfig, MetricsServer};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "failed to install rustls crypto provider")?;

    load_dotenv();

    // Initialize telemetry (OpenTelemetry + tracing)
    let _telemetry_guard = telemetry::init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Sense exporter");

    let config = ExporterConfig::from_env()?;
    log_config(&config);

    let clients = connect_all(&config.accounts, &config.endpoints).await?;
    let exporter = Exporter::new(clients, config.collection.timeout)
        .with_source(Box::new(ProcessCollector::new()))
        .with_source(Box::new(RuntimeCollector));
    tracing::info!(accounts = exporter.client_count(), "Accounts configured");

    let shutdown_token = CancellationToken::new();
    let server = MetricsServer::new(
        config.server.listen,
        Arc::new(exporter),
        shutdown_token.clone(),
    );

    let mut server_handle = tokio::spawn(server.run());

    tracing::info!("Sense exporter ready");

    tokio::select! {
        () = await_shutdown(shutdown_token.clone()) => {
            if let Ok(Err(e)) = (&mut server_handle).await {
                tracing::error!(error = %e, "Metrics server error");
            }
        }
        result = &mut server_handle => {
            // Server ended without a shutdown signal (bind failure)
            result??;
        }
    }

    tracing::info!("Sense exporter stopped");
    Ok(())
}

/// Log the parsed configuration.
fn log_config(config: &ExporterConfig) {
    tracing::info!(
        listen = %config.server.listen,
        timeout_secs = config.collection.timeout.as_secs(),
        accounts = ?config.accounts.iter().map(|a| a.email()).collect::<Vec<_>>(),
        "Configuration loaded"
    );
    tracing::debug!(
        api_url = %config.endpoints.api_url,
        realtime_url = %config.endpoints.realtime_url,
        "Sense endpoints"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();
}
