//! Configuration for talking to the recognition service.
//!
//! All client behaviour is controlled through [`ClientConfig`], built via
//! [`ClientConfigBuilder`]. A config holds no per-call state, so a single
//! instance can be cloned freely and shared across concurrent
//! [`crate::recognize`] calls.

use crate::error::SightError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::time::Duration;

/// Recognition endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://siftrics.com/api/sight/";

/// Fixed delay between polls. Default: 500 ms.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Configuration for a recognition call.
///
/// # Example
/// ```rust
/// use sight_ocr::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::builder()
///     .api_key("xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx")
///     .poll_interval(Duration::from_millis(250))
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Credential sent verbatim as `Authorization: Basic <api_key>`.
    ///
    /// The value is *not* base64-encoded user:password; the `Basic` scheme
    /// name is what the service expects in front of a raw key.
    pub api_key: String,

    /// Submission endpoint. Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// Delay after an empty poll and between non-final batches. Default: 500 ms.
    pub poll_interval: Duration,

    /// Per-HTTP-request timeout. Default: none.
    ///
    /// The service gives no upper bound on recognition time, so by default a
    /// stalled server blocks the caller indefinitely. Set this to bound each
    /// individual request; the total polling duration stays unbounded.
    pub request_timeout: Option<Duration>,

    /// Pre-built HTTP client. Takes precedence over `request_timeout`.
    pub http_client: Option<reqwest::Client>,

    /// Optional per-batch progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: None,
            http_client: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &redact(&self.api_key))
            .field("endpoint", &self.endpoint)
            .field("poll_interval", &self.poll_interval)
            .field("request_timeout", &self.request_timeout)
            .field("http_client", &self.http_client.as_ref().map(|_| "<reqwest::Client>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn RecognitionProgressCallback>"),
            )
            .finish()
    }
}

fn redact(key: &str) -> String {
    if key.is_empty() {
        return String::new();
    }
    if key.chars().count() <= 4 {
        return "****".to_string();
    }
    let start = key.char_indices().rev().nth(3).map(|(i, _)| i).unwrap_or(0);
    format!("****{}", &key[start..])
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Shorthand for a validated config with default settings.
    pub fn new(api_key: impl Into<String>) -> Result<Self, SightError> {
        Self::builder().api_key(api_key).build()
    }

    /// The HTTP client to use for one recognition call.
    pub(crate) fn http(&self) -> Result<reqwest::Client, SightError> {
        if let Some(ref client) = self.http_client {
            return Ok(client.clone());
        }

        let mut builder =
            reqwest::Client::builder().user_agent(concat!("sight-ocr/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|e| SightError::Internal(format!("failed to build HTTP client: {e}")))
    }

    pub(crate) fn validate(&self) -> Result<(), SightError> {
        if self.api_key.trim().is_empty() {
            return Err(SightError::InvalidConfig("API key must not be empty".into()));
        }
        match reqwest::Url::parse(&self.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(SightError::InvalidConfig(format!(
                    "endpoint must be http or https, got scheme '{}'",
                    url.scheme()
                )))
            }
            Err(e) => {
                return Err(SightError::InvalidConfig(format!(
                    "endpoint '{}' is not a valid URL: {e}",
                    self.endpoint
                )))
            }
        }
        if self.poll_interval.is_zero() {
            return Err(SightError::InvalidConfig(
                "poll interval must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.config.http_client = Some(client);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, SightError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
