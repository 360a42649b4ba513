//! Single-attempt transports.
//!
//! A transport performs exactly one request and classifies its outcome.
//! Timeouts, retries and cancellation are layered on top by `OcrClient`.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, warn};

use clipocr_models::Payload;

use crate::config::OcrClientConfig;
use crate::error::{OcrError, OcrResult};

/// Multipart field the service reads the image from.
pub const UPLOAD_FIELD: &str = "image";

/// File name sent with the image part.
pub const UPLOAD_FILENAME: &str = "clip.jpg";

/// One recognition attempt against the remote service.
#[async_trait]
pub trait OcrTransport: Send + Sync {
    /// Submit `payload` once and return the recognized text.
    ///
    /// Implementations map a 503 response to `ServiceUnavailable`, any other
    /// non-success status to `RemoteError` and connectivity failures to
    /// `Transport`.
    async fn recognize(&self, payload: &Payload, request_tag: Option<&str>) -> OcrResult<String>;

    /// Check whether the service is reachable.
    async fn health_check(&self) -> bool {
        true
    }
}

/// Transport that posts multipart requests with reqwest.
pub struct HttpTransport {
    http: Client,
    endpoint: String,
    tag_param: String,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    ///
    /// No client-level request timeout is set: the per-attempt budget is
    /// enforced by the caller so it can be classified as a retryable timeout.
    pub fn new(config: &OcrClientConfig) -> OcrResult<Self> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| OcrError::config(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            tag_param: config.tag_param.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build a fresh multipart form. Forms are consumed by sending, so every
    /// attempt gets its own.
    fn build_form(payload: &Payload) -> OcrResult<Form> {
        let part = Part::bytes(payload.as_bytes().to_vec())
            .file_name(UPLOAD_FILENAME)
            .mime_str("image/jpeg")?;
        Ok(Form::new().part(UPLOAD_FIELD, part))
    }
}

#[async_trait]
impl OcrTransport for HttpTransport {
    async fn recognize(&self, payload: &Payload, request_tag: Option<&str>) -> OcrResult<String> {
        let form = Self::build_form(payload)?;

        let mut request = self
            .http
            .post(&self.endpoint)
            .header(ACCEPT, "text/plain")
            .multipart(form);

        if let Some(tag) = request_tag {
            request = request.query(&[(self.tag_param.as_str(), tag)]);
        }

        debug!(endpoint = %self.endpoint, bytes = payload.len(), "Sending OCR request");

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.text().await?);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), body = %body, "OCR service returned error status");
        Err(OcrError::from_http_status(status.as_u16()))
    }

    async fn health_check(&self) -> bool {
        match self.http.get(&self.endpoint).send().await {
            Ok(response) if !response.status().is_server_error() => true,
            Ok(response) => {
                warn!("OCR service health check failed: {}", response.status());
                false
            }
            Err(e) => {
                warn!("OCR service health check error: {}", e);
                false
            }
        }
    }
}
