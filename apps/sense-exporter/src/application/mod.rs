//! Application Layer - Collection use cases and port definitions.
//!
//! Drives the domain once per scrape: the coordinator fans out to one
//! collector per monitor, each collector fetches the device catalog and
//! folds the realtime feed into samples.

/// Port interfaces for the Sense account and process-level sources.
pub mod ports;

/// Cancellation and deadline handling for one collection.
pub mod context;

/// Device catalog fetching.
pub mod catalog;

/// Per-monitor collection.
pub mod collector;

/// Per-request fan-out over all monitors.
pub mod scrape;

#[cfg(test)]
pub(crate) mod testing;
