//! Exporter Configuration Settings
//!
//! Configuration types for the exporter, loaded from environment variables.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Default metrics port.
pub const DEFAULT_PORT: u16 = 9553;

/// Default Sense REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.sense.com/apiservice/api/v1";

/// Default Sense realtime feed base URL.
pub const DEFAULT_REALTIME_URL: &str = "wss://clientrt.sense.com";

/// Sense account credentials.
#[derive(Clone)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    /// Create new credentials.
    #[must_use]
    pub const fn new(email: String, password: String) -> Self {
        Self { email, password }
    }

    /// Get the account e-mail.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Get the password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Address the metrics server binds to.
    pub listen: SocketAddr,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
        }
    }
}

/// Collection settings.
#[derive(Debug, Clone)]
pub struct CollectionSettings {
    /// Timeout of one monitor collection (zero = no timeout).
    pub timeout: Duration,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

/// Sense endpoint settings.
#[derive(Debug, Clone)]
pub struct EndpointSettings {
    /// REST API base URL, without trailing slash.
    pub api_url: String,
    /// Realtime feed base URL, without trailing slash.
    pub realtime_url: String,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            realtime_url: DEFAULT_REALTIME_URL.to_string(),
        }
    }
}

/// Complete exporter configuration.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// One entry per Sense account, in configuration order.
    pub accounts: Vec<Credentials>,
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Collection settings.
    pub collection: CollectionSettings,
    /// Sense endpoints.
    pub endpoints: EndpointSettings,
}

impl ExporterConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if no account is configured, a password or accounts
    /// file cannot be read, or the listen address is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Create configuration from any variable lookup.
    ///
    /// Accounts come from `SENSE_EMAIL` / `SENSE_PASSWORD[_FILE]` first,
    /// then from the `SENSE_CONFIG` accounts file.
    ///
    /// # Errors
    ///
    /// See [`ExporterConfig::from_env`].
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut accounts = Vec::new();
        if let Some(credentials) = env_account(&var)? {
            accounts.push(credentials);
        }
        if let Some(path) = var("SENSE_CONFIG").filter(|v| !v.is_empty()) {
            accounts.extend(read_accounts_file(Path::new(&path))?);
        }
        if accounts.is_empty() {
            return Err(ConfigError::MissingEnvVar(
                "SENSE_EMAIL or SENSE_CONFIG".to_string(),
            ));
        }

        let server = ServerSettings {
            listen: listen_addr(&var)?,
        };

        let collection = CollectionSettings {
            timeout: var("SENSE_EXPORTER_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .map_or(CollectionSettings::default().timeout, Duration::from_secs),
        };

        let endpoints = EndpointSettings {
            api_url: url_or(var("SENSE_API_URL"), DEFAULT_API_URL),
            realtime_url: url_or(var("SENSE_REALTIME_URL"), DEFAULT_REALTIME_URL),
        };

        Ok(Self {
            accounts,
            server,
            collection,
            endpoints,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Variable could not be parsed.
    #[error("invalid value for {key}: {value}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Rejected value.
        value: String,
    },
    /// Password file could not be read.
    #[error("failed to read password file {path}: {source}")]
    PasswordFile {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Accounts file could not be read.
    #[error("failed to read accounts file {path}: {source}")]
    AccountsFile {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Accounts file is not valid.
    #[error("invalid accounts file {path}: {message}")]
    InvalidAccountsFile {
        /// File that was read.
        path: PathBuf,
        /// What is wrong with it.
        message: String,
    },
}

/// Read the first line of a password file, without its line ending.
///
/// # Errors
///
/// Returns [`ConfigError::PasswordFile`] if the file cannot be read.
pub fn read_password_file(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::PasswordFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content.lines().next().unwrap_or_default().to_string())
}

/// Entry of the accounts file.
#[derive(Debug, Deserialize)]
struct AccountEntry {
    email: String,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    password_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct AccountsFile {
    accounts: Vec<AccountEntry>,
}

/// Read a JSON accounts file:
///
/// ```json
/// {"accounts": [
///   {"email": "a@example.com", "password": "..."},
///   {"email": "b@example.com", "password_file": "/run/secrets/b"}
/// ]}
/// ```
///
/// Relative `password_file` paths are resolved against the accounts file's
/// directory.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or an entry has
/// no usable password.
pub fn read_accounts_file(path: &Path) -> Result<Vec<Credentials>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::AccountsFile {
        path: path.to_path_buf(),
        source,
    })?;
    let invalid = |message: String| ConfigError::InvalidAccountsFile {
        path: path.to_path_buf(),
        message,
    };

    let file: AccountsFile =
        serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    file.accounts
        .into_iter()
        .map(|entry| {
            if entry.email.is_empty() {
                return Err(invalid("account with empty email".to_string()));
            }
            let password = match (entry.password, entry.password_file) {
                (Some(password), _) => password,
                (None, Some(file)) => read_password_file(&base.join(file))?,
                (None, None) => {
                    return Err(invalid(format!("no password for {}", entry.email)));
                }
            };
            if password.is_empty() {
                return Err(invalid(format!("empty password for {}", entry.email)));
            }
            Ok(Credentials::new(entry.email, password))
        })
        .collect()
}

/// Parse a listen address. `:9553` binds every interface.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] when the address cannot be parsed.
pub fn parse_listen_addr(value: &str) -> Result<SocketAddr, ConfigError> {
    let normalized = if value.starts_with(':') {
        format!("0.0.0.0{value}")
    } else {
        value.to_string()
    };
    normalized
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key: "SENSE_EXPORTER_LISTEN".to_string(),
            value: value.to_string(),
        })
}

fn env_account(var: &impl Fn(&str) -> Option<String>) -> Result<Option<Credentials>, ConfigError> {
    let Some(email) = var("SENSE_EMAIL") else {
        return Ok(None);
    };
    if email.is_empty() {
        return Err(ConfigError::EmptyValue("SENSE_EMAIL".to_string()));
    }

    let password = match var("SENSE_PASSWORD") {
        Some(password) => password,
        None => {
            let path = var("SENSE_PASSWORD_FILE").ok_or_else(|| {
                ConfigError::MissingEnvVar("SENSE_PASSWORD or SENSE_PASSWORD_FILE".to_string())
            })?;
            read_password_file(Path::new(&path))?
        }
    };
    if password.is_empty() {
        return Err(ConfigError::EmptyValue("SENSE_PASSWORD".to_string()));
    }

    Ok(Some(Credentials::new(email, password)))
}

fn listen_addr(var: &impl Fn(&str) -> Option<String>) -> Result<SocketAddr, ConfigError> {
    if let Some(listen) = var("SENSE_EXPORTER_LISTEN").filter(|v| !v.is_empty()) {
        return parse_listen_addr(&listen);
    }
    let port = var("SENSE_EXPORTER_PORT")
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    Ok(SocketAddr::from(([0, 0, 0, 0], port)))
}

fn url_or(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .map_or_else(|| default.to_string(), |v| v.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use test_case::test_case;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ExporterConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ExporterConfig::from_vars(|key| vars.get(key).cloned())
    }

    fn accounts_file(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("accounts.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn single_account_from_env() {
        let config = load(&[("SENSE_EMAIL", "me@example.com"), ("SENSE_PASSWORD", "pw")]).unwrap();

        assert_eq!(config.accounts.len(), 1);
        assert_eq!(config.accounts[0].email(), "me@example.com");
        assert_eq!(config.server.listen, ServerSettings::default().listen);
        assert_eq!(config.collection.timeout, Duration::from_secs(10));
        assert_eq!(config.endpoints.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn two_accounts_from_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.secret"), "pw-b\n").unwrap();
        let path = accounts_file(
            dir.path(),
            r#"{"accounts": [
                {"email": "a@example.com", "password": "pw-a"},
                {"email": "b@example.com", "password_file": "b.secret"}
            ]}"#,
        );

        let config = load(&[("SENSE_CONFIG", path.to_str().unwrap())]).unwrap();

        let emails: Vec<&str> = config.accounts.iter().map(Credentials::email).collect();
        assert_eq!(emails, vec!["a@example.com", "b@example.com"]);
        assert_eq!(config.accounts[1].password(), "pw-b");
    }

    #[test]
    fn env_account_comes_before_file_accounts() {
        let dir = tempfile::tempdir().unwrap();
        let path = accounts_file(
            dir.path(),
            r#"{"accounts": [{"email": "b@example.com", "password": "pw-b"}]}"#,
        );

        let config = load(&[
            ("SENSE_EMAIL", "a@example.com"),
            ("SENSE_PASSWORD", "pw-a"),
            ("SENSE_CONFIG", path.to_str().unwrap()),
        ])
        .unwrap();

        assert_eq!(config.accounts.len(), 2);
        assert_eq!(config.accounts[0].email(), "a@example.com");
    }

    #[test]
    fn no_accounts_is_an_error() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingEnvVar(_))));
    }

    #[test_case(r#"{"accounts": [{"email": "a@example.com"}]}"# ; "no password")]
    #[test_case(r#"{"accounts": [{"email": "", "password": "x"}]}"# ; "empty email")]
    #[test_case(r#"{"users": []}"# ; "wrong shape")]
    fn invalid_accounts_file(content: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = accounts_file(dir.path(), content);

        let err = read_accounts_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAccountsFile { .. }));
    }

    #[test_case(":9553", "0.0.0.0:9553" ; "port only")]
    #[test_case("127.0.0.1:8080", "127.0.0.1:8080" ; "ipv4")]
    #[test_case("[::1]:9553", "[::1]:9553" ; "ipv6")]
    fn listen_addresses(value: &str, expected: &str) {
        assert_eq!(
            parse_listen_addr(value).unwrap(),
            expected.parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn listen_overrides_port() {
        let config = load(&[
            ("SENSE_EMAIL", "me@example.com"),
            ("SENSE_PASSWORD", "pw"),
            ("SENSE_EXPORTER_PORT", "1234"),
            ("SENSE_EXPORTER_LISTEN", "127.0.0.1:9000"),
        ])
        .unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());

        let config = load(&[
            ("SENSE_EMAIL", "me@example.com"),
            ("SENSE_PASSWORD", "pw"),
            ("SENSE_EXPORTER_PORT", "1234"),
        ])
        .unwrap();
        assert_eq!(config.server.listen.port(), 1234);
    }

    #[test]
    fn invalid_listen_address() {
        let err = load(&[
            ("SENSE_EMAIL", "me@example.com"),
            ("SENSE_PASSWORD", "pw"),
            ("SENSE_EXPORTER_LISTEN", "localhost"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn credentials_redacted_debug() {
        let creds = Credentials::new("me@example.com".to_string(), "hunter2".to_string());
        let debug = format!("{creds:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("me@example.com"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn password_file_first_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "s3cret").unwrap();
        writeln!(file, "ignored").unwrap();

        let password = read_password_file(file.path()).unwrap();
        assert_eq!(password, "s3cret");
    }

    #[test]
    fn missing_password_file() {
        let err = read_password_file(Path::new("/nonexistent/sense-password")).unwrap_err();
        assert!(matches!(err, ConfigError::PasswordFile { .. }));
    }

    #[test]
    fn server_settings_defaults() {
        assert_eq!(
            ServerSettings::default().listen,
            "0.0.0.0:9553".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn collection_settings_defaults() {
        assert_eq!(
            CollectionSettings::default().timeout,
            Duration::from_secs(10)
        );
    }

    #[test]
    fn endpoint_settings_defaults() {
        let settings = EndpointSettings::default();
        assert_eq!(settings.api_url, DEFAULT_API_URL);
        assert!(settings.realtime_url.starts_with("wss://"));
    }
}
