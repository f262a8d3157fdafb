//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer, plus the process plumbing around them.

/// Sense REST and realtime feed client.
pub mod sense;

/// Configuration loading.
pub mod config;

/// Scrape HTTP endpoint.
pub mod http;

/// Prometheus exposition and process/runtime collectors.
pub mod metrics;

/// OpenTelemetry tracing integration.
pub mod telemetry;
