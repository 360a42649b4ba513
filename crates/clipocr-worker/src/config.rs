//! Worker configuration.

use clipocr_ocr_client::OcrClientConfig;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// OCR client settings
    pub ocr: OcrClientConfig,
    /// Buffered progress events per subscriber
    pub progress_capacity: usize,
    /// Layout hint sent with every clip
    pub request_tag: Option<String>,
    /// Credits charged per recognized clip
    pub credits_per_clip: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            ocr: OcrClientConfig::default(),
            progress_capacity: 256,
            request_tag: Some("1column".to_string()),
            credits_per_clip: 1,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            ocr: OcrClientConfig::from_env(),
            progress_capacity: std::env::var("WORKER_PROGRESS_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(256),
            // An empty value disables the hint.
            request_tag: match std::env::var("WORKER_REQUEST_TAG") {
                Ok(tag) if tag.trim().is_empty() => None,
                Ok(tag) => Some(tag),
                Err(_) => Some("1column".to_string()),
            },
            credits_per_clip: std::env::var("WORKER_CREDITS_PER_CLIP")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
        }
    }

    pub fn with_request_tag(mut self, tag: Option<String>) -> Self {
        self.request_tag = tag;
        self
    }
}
