//! HTTP transport seam.
//!
//! The `Transport` trait abstracts the wire so the fetch client's retry loop
//! can be driven by a scripted fake in tests. The real implementation talks
//! to the transparency-report traffic endpoint over blocking reqwest.
//!
//! The endpoint is unofficial and subject to unannounced format changes;
//! structural problems with the body are not transport errors — they are
//! handled downstream by the decoder.

use crate::series::timestamp_to_millis;
use crate::window::RequestWindow;
use std::time::Duration;
use thiserror::Error;

/// Traffic-fraction endpoint of the transparency report API.
pub const API_BASE_URL: &str =
    "https://transparencyreport.google.com/transparencyreport/api/v3/traffic/fraction";

/// Product identifier for YouTube traffic.
pub const YOUTUBE_PRODUCT_ID: u32 = 21;

/// Transport-level failures. All variants are transient from the caller's
/// point of view and eligible for retry with backoff.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP {status}")]
    Http { status: u16 },

    #[error("network error: {0}")]
    Network(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout)
    }
}

/// One raw request per (entity, window). Returns the response body as text,
/// security preamble and all.
pub trait Transport {
    fn fetch_raw(&self, window: &RequestWindow) -> Result<String, TransportError>;
}

/// Blocking HTTP transport against the real endpoint.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
    product_id: u32,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::with_base_url(API_BASE_URL)
    }

    /// Point the transport at a different base URL (local test servers).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            product_id: YOUTUBE_PRODUCT_ID,
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn fetch_raw(&self, window: &RequestWindow) -> Result<String, TransportError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("start", timestamp_to_millis(window.start).to_string()),
                ("end", timestamp_to_millis(window.end).to_string()),
                ("region", window.entity_id.clone()),
                ("product", self.product_id.to_string()),
            ])
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Network(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
            });
        }

        resp.text().map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Network(e.to_string())
            }
        })
    }
}
