//! Domain Layer - Monitor model, metric schema and stream aggregation.
//!
//! Pure types with no I/O. Everything here is driven by the application
//! layer once per monitor per scrape.

/// Monitor, device and stream message types.
pub mod model;

/// Device metadata lookup.
pub mod catalog;

/// Metric descriptors and samples.
pub mod metrics;

/// Folding of realtime feed messages into samples.
pub mod aggregator;
