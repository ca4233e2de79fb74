//! HTTP client wrapper for the PDF-to-text converter service.

use crate::clients::{format_endpoint, http_client, normalize_base_url};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, StatusCode};
use thiserror::Error;
use tokio_util::io::ReaderStream;

/// Errors returned while interacting with the converter.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid converter URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Converter responded with an unexpected status code.
    #[error("Unexpected converter response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from the converter.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Lightweight HTTP client posting raw document bytes for text extraction.
pub struct ConverterClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
}

impl ConverterClient {
    /// Construct a new client for the given service base URL.
    pub fn new(base_url: &str) -> Result<Self, ConvertError> {
        let base_url = normalize_base_url(base_url).map_err(ConvertError::InvalidUrl)?;
        Ok(Self {
            client: http_client()?,
            base_url,
        })
    }

    /// Stream the raw artifact as a multipart field and return the
    /// plain-text response stream. Memory use stays bounded regardless of
    /// document size.
    pub async fn convert(
        &self,
        raw: tokio::fs::File,
        file_name: &str,
    ) -> Result<reqwest::Response, ConvertError> {
        let part = Part::stream(Body::wrap_stream(ReaderStream::new(raw)))
            .file_name(file_name.to_string())
            .mime_str("application/pdf")?;
        let form = Form::new().part("document", part);

        let response = self
            .client
            .post(format_endpoint(&self.base_url, "convert"))
            .multipart(form)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = ConvertError::UnexpectedStatus { status, body };
            tracing::error!(document = file_name, error = %error, "Conversion request failed");
            Err(error)
        }
    }
}
