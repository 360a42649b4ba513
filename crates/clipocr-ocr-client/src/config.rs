//! OCR client configuration.

use std::time::Duration;

/// Configuration for the OCR client.
#[derive(Debug, Clone)]
pub struct OcrClientConfig {
    /// Recognition endpoint URL
    pub endpoint: String,
    /// Per-attempt time budget
    pub timeout: Duration,
    /// TCP connect timeout for the HTTP client
    pub connect_timeout: Duration,
    /// Total attempt budget per call
    pub max_retries: u32,
    /// Base delay for exponential backoff (doubles each attempt)
    pub base_delay: Duration,
    /// Query parameter carrying the request tag (layout hint)
    pub tag_param: String,
    /// Also retry connectivity-level failures
    pub retry_transport_errors: bool,
}

impl Default for OcrClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/ocr".to_string(),
            timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
            max_retries: 3,
            base_delay: Duration::from_millis(2000),
            tag_param: "image_type".to_string(),
            retry_transport_errors: false,
        }
    }
}

impl OcrClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            endpoint: std::env::var("OCR_SERVICE_URL").unwrap_or(defaults.endpoint),
            timeout: Duration::from_millis(
                std::env::var("OCR_TIMEOUT_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120_000),
            ),
            connect_timeout: Duration::from_millis(
                std::env::var("OCR_CONNECT_TIMEOUT_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10_000),
            ),
            max_retries: std::env::var("OCR_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            base_delay: Duration::from_millis(
                std::env::var("OCR_RETRY_BASE_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2000),
            ),
            tag_param: std::env::var("OCR_TAG_PARAM").unwrap_or(defaults.tag_param),
            retry_transport_errors: std::env::var("OCR_RETRY_TRANSPORT_ERRORS")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_retry_transport_errors(mut self, enabled: bool) -> Self {
        self.retry_transport_errors = enabled;
        self
    }
}
