//! Client configuration.
//!
//! `ApiClientConfig` is fixed when a client is constructed. `from_env` reads
//! the API origin and transport knobs once, falling back to the defaults of
//! the browser apps (local API, 10s timeout, credentials included).

use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

pub const ENV_BASE_URL: &str = "WENSHU_API_URL";
pub const ENV_TIMEOUT_MS: &str = "WENSHU_API_TIMEOUT_MS";
pub const ENV_WITH_CREDENTIALS: &str = "WENSHU_API_WITH_CREDENTIALS";

/// Whether cookies travel with requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credentials {
    /// Send and store cookies for every origin.
    Include,
    /// Only the default, same-origin behaviour.
    SameOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiClientConfig {
    /// Prefix for every request path. Joined without normalisation.
    pub base_url: String,
    /// Per-request deadline. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Headers added to every request, overridable per call.
    pub headers: Vec<(String, String)>,
    pub with_credentials: bool,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
            headers: Vec::new(),
            with_credentials: true,
        }
    }
}

impl ApiClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
            headers: Vec::new(),
            with_credentials: false,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = with_credentials;
        self
    }

    pub fn credentials(&self) -> Credentials {
        if self.with_credentials {
            Credentials::Include
        } else {
            Credentials::SameOrigin
        }
    }

    /// Load configuration from `WENSHU_API_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let base_url = lookup(ENV_BASE_URL)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.base_url);

        let timeout = match lookup(ENV_TIMEOUT_MS) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) => None,
                Ok(ms) => Some(Duration::from_millis(ms)),
                Err(_) => {
                    tracing::warn!("{ENV_TIMEOUT_MS}={raw:?} is not a number, using default");
                    defaults.timeout
                }
            },
            None => defaults.timeout,
        };

        let with_credentials = match lookup(ENV_WITH_CREDENTIALS).as_deref().map(str::trim) {
            Some("1") | Some("true") | Some("yes") => true,
            Some("0") | Some("false") | Some("no") => false,
            Some(other) => {
                tracing::warn!("{ENV_WITH_CREDENTIALS}={other:?} is not a boolean, using default");
                defaults.with_credentials
            }
            None => defaults.with_credentials,
        };

        Self {
            base_url,
            timeout,
            headers: Vec::new(),
            with_credentials,
        }
    }
}
