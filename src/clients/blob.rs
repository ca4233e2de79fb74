//! HTTP client wrapper for the binary blob store.

use crate::clients::{format_endpoint, http_client, normalize_base_url};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use thiserror::Error;

/// Errors returned while interacting with the blob store.
#[derive(Debug, Error)]
pub enum BlobError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid blob store URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Blob store responded with an unexpected status code.
    #[error("Unexpected blob store response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from the blob store.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Binary record upserted for one harvested document.
///
/// `name` always equals the [`crate::clients::IndexRecord`] id produced for
/// the same document in the same run; the two stores must never disagree on
/// identity for one logical document.
#[derive(Debug, Clone, Serialize)]
pub struct BlobRecord {
    /// Content hash shared with the index record.
    pub name: String,
    /// Base64 of the original raw document bytes.
    pub content: String,
}

impl BlobRecord {
    /// Build a record from the shared content hash and the raw bytes.
    pub fn from_raw(name: impl Into<String>, raw: &[u8]) -> Self {
        Self {
            name: name.into(),
            content: BASE64.encode(raw),
        }
    }
}

/// Lightweight HTTP client upserting raw document payloads into the blob store.
pub struct BlobClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
}

impl BlobClient {
    /// Construct a new client for the given service base URL.
    pub fn new(base_url: &str) -> Result<Self, BlobError> {
        let base_url = normalize_base_url(base_url).map_err(BlobError::InvalidUrl)?;
        Ok(Self {
            client: http_client()?,
            base_url,
        })
    }

    /// Upsert a blob keyed by the shared content hash.
    pub async fn upsert(&self, record: &BlobRecord) -> Result<(), BlobError> {
        let response = self
            .client
            .put(format_endpoint(
                &self.base_url,
                &format!("blobs/{}", record.name),
            ))
            .json(record)
            .send()
            .await?;

        if response.status().is_success() {
            tracing::debug!(name = %record.name, "Blob record upserted");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = BlobError::UnexpectedStatus { status, body };
            tracing::error!(name = %record.name, error = %error, "Blob upsert failed");
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::PUT, MockServer};
    use serde_json::json;

    #[test]
    fn from_raw_encodes_standard_base64() {
        let record = BlobRecord::from_raw("abc123", b"%PDF-1.4");
        assert_eq!(record.content, "JVBERi0xLjQ=");
    }

    #[tokio::test]
    async fn upsert_puts_base64_payload() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT).path("/blobs/abc123").json_body(json!({
                    "name": "abc123",
                    "content": "JVBERi0xLjQ="
                }));
                then.status(200);
            })
            .await;

        let client = BlobClient::new(&server.base_url()).expect("client");
        client
            .upsert(&BlobRecord::from_raw("abc123", b"%PDF-1.4"))
            .await
            .expect("upsert");

        mock.assert();
    }
}
