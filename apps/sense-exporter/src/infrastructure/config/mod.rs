//! Configuration Module
//!
//! Configuration loading for the exporter.

mod settings;

pub use settings::{
    CollectionSettings, ConfigError, Credentials, DEFAULT_API_URL, DEFAULT_PORT,
    DEFAULT_REALTIME_URL, EndpointSettings, ExporterConfig, ServerSettings, parse_listen_addr,
    read_accounts_file, read_password_file,
};
