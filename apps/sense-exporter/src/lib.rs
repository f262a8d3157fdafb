#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Sense Exporter - Prometheus bridge for Sense energy monitors
//!
//! Every scrape of `/metrics` fans out to all monitors of all configured
//! accounts. Each monitor collection fetches the device catalog, reads the
//! realtime feed until it has seen one realtime update and one device state
//! batch, and turns both into gauges. Nothing is cached between scrapes.
//!
//! # Layers (inside -> outside)
//!
//! - **Domain**: metric schema and stream folding
//!   - `model`: monitors, devices and feed messages
//!   - `metrics`: descriptors and samples
//!   - `catalog`: device metadata lookup
//!   - `aggregator`: feed messages to samples
//!
//! - **Application**: collection use cases and port definitions
//!   - `ports`: the `SenseClient` capability
//!   - `collector`: one monitor, one scrape
//!   - `scrape`: all monitors, one request
//!
//! - **Infrastructure**: adapters and process plumbing
//!   - `sense`: REST and realtime feed client
//!   - `http`: the `/metrics` endpoint
//!   - `metrics`: Prometheus text rendering, process and runtime gauges
//!   - `config`: environment configuration
//!   - `telemetry`: tracing and OpenTelemetry
//!
//! # Data Flow
//!
//! ```text
//! GET /metrics -> Exporter::scrape -> MonitorCollector (one per monitor)
//!                                       |-- get_devices -> DeviceCatalog
//!                                       |-- stream ----> StreamAggregator
//!                                       `-- up, scrape_time
//!              <- render (text format)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Metric schema and stream folding with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::metrics::{DESCRIPTORS, Descriptors, MetricDesc, Sample};
pub use domain::model::{
    Device, DeviceReading, DeviceState, DeviceStateBatch, Monitor, MonitorId, RealtimeUpdate,
    StreamMessage,
};

// Ports and use cases
pub use application::context::CollectContext;
pub use application::ports::{ClientError, OnMessage, SampleSource, SenseClient, Stopped};
pub use application::scrape::{Exporter, ScrapeResult};

// Infrastructure config
pub use infrastructure::config::{ConfigError, Credentials, ExporterConfig};

// HTTP server
pub use infrastructure::http::{MetricsServer, ServerError, router};

// Sense client
pub use infrastructure::sense::HttpSenseClient;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
