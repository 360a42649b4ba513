//! OCR client with per-attempt timeout, bounded retry and cancellation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

use clipocr_models::Payload;

use crate::config::OcrClientConfig;
use crate::error::{OcrError, OcrResult};
use crate::metrics::{record_attempt_latency, record_request, record_retry};
use crate::transport::{HttpTransport, OcrTransport};

/// Options for a single `OcrClient::call`.
#[derive(Debug, Clone)]
pub struct CallOptions {
    /// Time budget for each attempt
    pub timeout: Duration,
    /// Total attempt budget (0 is treated as 1)
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub base_delay: Duration,
    /// Passed to the service as a selector (layout hint)
    pub request_tag: Option<String>,
    /// Abandons the in-flight attempt or backoff when set to `true`
    pub cancel: Option<watch::Receiver<bool>>,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            base_delay: Duration::from_millis(2000),
            request_tag: None,
            cancel: None,
        }
    }
}

impl CallOptions {
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

    pub fn with_request_tag(mut self, tag: impl Into<String>) -> Self {
        self.request_tag = Some(tag.into());
        self
    }

    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Number of attempts a call may make.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Delay after failed attempt `attempt` (0-based): `base * 2^attempt`, uncapped.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Client for the remote OCR service.
#[derive(Clone)]
pub struct OcrClient {
    transport: Arc<dyn OcrTransport>,
    config: OcrClientConfig,
}

impl OcrClient {
    /// Create a new OCR client backed by HTTP.
    pub fn new(config: OcrClientConfig) -> OcrResult<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self {
            transport: Arc::new(transport),
            config,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> OcrResult<Self> {
        Self::new(OcrClientConfig::from_env())
    }

    /// Create a client over a custom transport.
    pub fn with_transport(transport: Arc<dyn OcrTransport>, config: OcrClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &OcrClientConfig {
        &self.config
    }

    /// Call options seeded from the client configuration.
    pub fn call_options(&self) -> CallOptions {
        CallOptions {
            timeout: self.config.timeout,
            max_retries: self.config.max_retries,
            base_delay: self.config.base_delay,
            request_tag: None,
            cancel: None,
        }
    }

    /// Check if the OCR service is reachable.
    pub async fn health_check(&self) -> bool {
        self.transport.health_check().await
    }

    /// Recognize text in `payload`.
    ///
    /// Retryable failures are retried until the attempt budget runs out; the
    /// error of the last attempt is returned. Fatal failures return on the
    /// attempt that produced them.
    pub async fn call(&self, payload: &Payload, options: &CallOptions) -> OcrResult<String> {
        let max_attempts = options.max_attempts();
        let mut cancel = options.cancel.clone();
        let mut attempt = 0u32;

        loop {
            if is_cancelled(cancel.as_ref()) {
                record_request(OcrError::Cancelled.kind());
                return Err(OcrError::Cancelled);
            }

            let started = Instant::now();
            let outcome = self.attempt(payload, options, cancel.as_mut()).await;
            record_attempt_latency(started.elapsed().as_secs_f64());

            match outcome {
                Ok(text) => {
                    debug!(attempt = attempt + 1, chars = text.len(), "OCR call succeeded");
                    record_request("success");
                    return Ok(text);
                }
                Err(e) if self.should_retry(&e) && attempt + 1 < max_attempts => {
                    let delay = options.delay_for_attempt(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "OCR attempt failed, retrying: {}",
                        e
                    );
                    record_retry(e.kind());

                    if let Err(cancelled) = backoff(delay, cancel.as_mut()).await {
                        record_request(cancelled.kind());
                        return Err(cancelled);
                    }
                    attempt += 1;
                }
                Err(e) => {
                    debug!(attempt = attempt + 1, "OCR call failed: {}", e);
                    record_request(e.kind());
                    return Err(e);
                }
            }
        }
    }

    fn should_retry(&self, error: &OcrError) -> bool {
        error.is_retryable()
            || (self.config.retry_transport_errors && matches!(error, OcrError::Transport(_)))
    }

    /// Run one attempt under the per-attempt timeout. Dropping the transport
    /// future on timeout or cancellation aborts the in-flight request.
    async fn attempt(
        &self,
        payload: &Payload,
        options: &CallOptions,
        cancel: Option<&mut watch::Receiver<bool>>,
    ) -> OcrResult<String> {
        let request = tokio::time::timeout(
            options.timeout,
            self.transport
                .recognize(payload, options.request_tag.as_deref()),
        );

        let result = match cancel {
            Some(rx) => tokio::select! {
                result = request => result,
                _ = cancelled(rx) => return Err(OcrError::Cancelled),
            },
            None => request.await,
        };

        result.map_err(|_| OcrError::Timeout(options.timeout.as_millis() as u64))?
    }
}

fn is_cancelled(cancel: Option<&watch::Receiver<bool>>) -> bool {
    cancel.map(|rx| *rx.borrow()).unwrap_or(false)
}

/// Resolves once the signal flips to `true`. Never resolves if the sender
/// is dropped without cancelling.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn backoff(delay: Duration, cancel: Option<&mut watch::Receiver<bool>>) -> OcrResult<()> {
    match cancel {
        Some(rx) => tokio::select! {
            _ = tokio::time::sleep(delay) => Ok(()),
            _ = cancelled(rx) => Err(OcrError::Cancelled),
        },
        None => {
            tokio::time::sleep(delay).await;
            Ok(())
        }
    }
}
