//! Client for the remote OCR service.
//!
//! This crate provides a resilient single-call client: every attempt runs
//! under its own timeout, transient failures (timeouts, HTTP 503) are retried
//! with exponential backoff, and everything else fails fast with a typed
//! error. The HTTP exchange itself sits behind [`OcrTransport`].

pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod transport;

pub use client::{CallOptions, OcrClient};
pub use config::OcrClientConfig;
pub use error::{OcrError, OcrResult};
pub use transport::{HttpTransport, OcrTransport};
