//! Configuration options for the ECE client

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

/// API base URL used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";

/// Environment variable selecting the API base URL
pub const API_URL_ENV: &str = "ECE_API_URL";

/// Environment variable overriding the transport timeout, in seconds
pub const TIMEOUT_ENV: &str = "ECE_REQUEST_TIMEOUT_SECS";

/// Environment variable pointing at the durable session file
pub const SESSION_FILE_ENV: &str = "ECE_SESSION_FILE";

/// Configuration options for the ECE client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL of the REST API, including the `/api` prefix
    pub api_base_url: String,

    /// Fixed transport timeout; a call exceeding it fails as a network error
    pub request_timeout: Duration,

    /// Where the session is persisted. `None` keeps it in memory only.
    pub storage_path: Option<PathBuf>,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            storage_path: None,
            user_agent: format!("ece-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientOptions {
    /// Load options from the environment, falling back to defaults
    pub fn from_env() -> Result<Self, Error> {
        let mut options = Self::default();

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if url.trim().is_empty() {
                return Err(Error::config(format!("{} is set but empty", API_URL_ENV)));
            }
            options.api_base_url = url;
        }

        if let Ok(raw) = std::env::var(TIMEOUT_ENV) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| Error::config(format!("{} must be a number of seconds, got {:?}", TIMEOUT_ENV, raw)))?;
            options.request_timeout = Duration::from_secs(secs);
        }

        if let Ok(path) = std::env::var(SESSION_FILE_ENV) {
            options.storage_path = Some(PathBuf::from(path));
        }

        Ok(options)
    }

    /// Set the API base URL
    pub fn with_api_base_url(mut self, value: &str) -> Self {
        self.api_base_url = value.to_string();
        self
    }

    /// Set the transport timeout
    pub fn with_request_timeout(mut self, value: Duration) -> Self {
        self.request_timeout = value;
        self
    }

    /// Persist the session in a file
    pub fn with_storage_path(mut self, value: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(value.into());
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, value: &str) -> Self {
        self.user_agent = value.to_string();
        self
    }

    /// Base URL without a trailing slash
    pub(crate) fn normalized_base_url(&self) -> String {
        self.api_base_url.trim_end_matches('/').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ClientOptions::default();
        assert_eq!(options.api_base_url, DEFAULT_API_URL);
        assert_eq!(options.request_timeout, Duration::from_secs(30));
        assert!(options.storage_path.is_none());
    }

    #[test]
    fn test_builder_and_normalization() {
        let options = ClientOptions::default()
            .with_api_base_url("https://ece.example.org/api/")
            .with_request_timeout(Duration::from_secs(5))
            .with_storage_path("/tmp/ece-session.json");
        assert_eq!(options.normalized_base_url(), "https://ece.example.org/api");
        assert_eq!(options.request_timeout, Duration::from_secs(5));
        assert_eq!(
            options.storage_path,
            Some(PathBuf::from("/tmp/ece-session.json"))
        );
    }
}
