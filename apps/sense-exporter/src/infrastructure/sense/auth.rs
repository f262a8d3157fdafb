//! Sense Authentication
//!
//! Exchanges account credentials for an access token. The session is
//! established once at startup; there is no refresh.

use reqwest::{Client, Response, StatusCode};

use crate::application::ports::ClientError;
use crate::domain::model::Monitor;
use crate::infrastructure::config::Credentials;

use super::messages::AuthResponse;

/// Longest error body carried into a [`ClientError`].
const MAX_ERROR_BODY: usize = 512;

/// An authenticated account.
#[derive(Clone)]
pub struct SenseSession {
    access_token: String,
    user_id: i64,
    account_id: i64,
    monitors: Vec<Monitor>,
}

impl std::fmt::Debug for SenseSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SenseSession")
            .field("access_token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("account_id", &self.account_id)
            .field("monitors", &self.monitors)
            .finish()
    }
}

impl SenseSession {
    /// Create a session from known values.
    #[must_use]
    pub const fn new(
        access_token: String,
        user_id: i64,
        account_id: i64,
        monitors: Vec<Monitor>,
    ) -> Self {
        Self {
            access_token,
            user_id,
            account_id,
            monitors,
        }
    }

    /// Bearer token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// User identifier.
    #[must_use]
    pub const fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Account identifier.
    #[must_use]
    pub const fn account_id(&self) -> i64 {
        self.account_id
    }

    /// Monitors owned by the account.
    #[must_use]
    pub fn monitors(&self) -> &[Monitor] {
        &self.monitors
    }
}

impl From<AuthResponse> for SenseSession {
    fn from(auth: AuthResponse) -> Self {
        Self {
            access_token: auth.access_token,
            user_id: auth.user_id,
            account_id: auth.account_id,
            monitors: auth.monitors.into_iter().map(Monitor::from).collect(),
        }
    }
}

/// Authenticate against `{api_url}/authenticate`.
///
/// # Errors
///
/// Returns [`ClientError::Auth`] when the credentials are refused, and
/// another variant when the request cannot be made or decoded.
pub async fn authenticate(
    http: &Client,
    api_url: &str,
    credentials: &Credentials,
) -> Result<SenseSession, ClientError> {
    let url = format!("{api_url}/authenticate");
    tracing::debug!(url = %url, email = credentials.email(), "Authenticating");

    let response = http
        .post(&url)
        .form(&[
            ("email", credentials.email()),
            ("password", credentials.password()),
        ])
        .send()
        .await
        .map_err(|e| ClientError::Http(e.to_string()))?;

    let auth: AuthResponse = check_status(response)
        .await?
        .json()
        .await
        .map_err(|e| ClientError::Decode(e.to_string()))?;

    Ok(auth.into())
}

/// Turn a non-success response into an error.
///
/// 401 and 403 are [`ClientError::Auth`]; other failures keep their status.
pub(crate) async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClientError::Auth(body)),
        _ => Err(ClientError::Status {
            status: status.as_u16(),
            body,
        }),
    }
}
