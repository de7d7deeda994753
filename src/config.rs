//! Client configuration.
//!
//! Everything the client needs to talk to the extraction service and to
//! police uploads lives in [`ClientConfig`], built via its
//! [`ClientConfigBuilder`]. The same struct feeds
//! [`crate::client::HttpExtractionService`] and the
//! [`crate::session::FileGate`] owned by the orchestrator, so the local size
//! check and the service limit never drift apart.

use crate::error::PlaygroundError;
use serde::{Deserialize, Serialize};

/// Default base URL of the extraction service API.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// Default upload limit: 50 MiB, matching the service.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 52_428_800;

/// Configuration for the extraction client.
///
/// # Example
/// ```rust
/// use extraction_playground::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("https://extract.example.com/api/v1")
///     .request_timeout_secs(120)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_file_size, 52_428_800);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL the endpoint paths are resolved against.
    /// Default: `http://localhost:8000/api/v1`.
    pub base_url: String,

    /// Largest accepted upload in bytes. Default: 52 428 800 (50 MiB).
    pub max_file_size: u64,

    /// Whole-request timeout in seconds. Default: 600.
    ///
    /// A comparison runs every selected model on the server before
    /// answering, so multi-page documents can take several minutes.
    pub request_timeout_secs: u64,

    /// TCP/TLS connect timeout in seconds. Default: 10.
    pub connect_timeout_secs: u64,

    /// Ask the service to render annotated page images. Default: true.
    pub generate_annotations: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            request_timeout_secs: 600,
            connect_timeout_secs: 10,
            generate_annotations: true,
        }
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.connect_timeout_secs = secs;
        self
    }

    pub fn generate_annotations(mut self, v: bool) -> Self {
        self.config.generate_annotations = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, PlaygroundError> {
        let c = &self.config;
        let url = c.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(PlaygroundError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if c.max_file_size == 0 {
            return Err(PlaygroundError::InvalidConfig(
                "max file size must be ≥ 1 byte".into(),
            ));
        }
        if c.request_timeout_secs == 0 || c.connect_timeout_secs == 0 {
            return Err(PlaygroundError::InvalidConfig(
                "timeouts must be ≥ 1 second".into(),
            ));
        }
        let mut config = self.config;
        config.base_url = config.base_url.trim().to_string();
        Ok(config)
    }
}
