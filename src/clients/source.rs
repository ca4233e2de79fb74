//! HTTP client wrapper for the document source service.

use crate::clients::{format_endpoint, http_client, normalize_base_url};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Errors returned while interacting with the document source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid source URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Source responded with an unexpected status code.
    #[error("Unexpected source response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from the source.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Cursor timestamp could not be rendered to RFC3339.
    #[error("Failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// A document advertised by the source listing.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRef {
    /// Source-relative identifier, typically a file name like `a.pdf`.
    pub name: String,
}

#[derive(Deserialize)]
struct ListDocumentsResponse {
    documents: Vec<DocumentRef>,
}

/// Lightweight HTTP client for listing, fetching, and purging source documents.
pub struct DocumentSourceClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
}

impl DocumentSourceClient {
    /// Construct a new client for the given service base URL.
    pub fn new(base_url: &str) -> Result<Self, SourceError> {
        let base_url = normalize_base_url(base_url).map_err(SourceError::InvalidUrl)?;
        Ok(Self {
            client: http_client()?,
            base_url,
        })
    }

    /// Fetch URL for a named document; also the input to stage-key derivation.
    pub fn document_url(&self, name: &str) -> String {
        format_endpoint(&self.base_url, &format!("documents/{name}"))
    }

    /// List documents uploaded after `since`.
    pub async fn list_since(&self, since: OffsetDateTime) -> Result<Vec<DocumentRef>, SourceError> {
        let cursor = since.format(&Rfc3339)?;
        let response = self
            .client
            .get(format_endpoint(&self.base_url, "documents"))
            .query(&[("since", cursor.as_str())])
            .send()
            .await?;

        if response.status().is_success() {
            let payload: ListDocumentsResponse = response.json().await?;
            tracing::debug!(since = %cursor, count = payload.documents.len(), "Listed source documents");
            Ok(payload.documents)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = SourceError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Failed to list source documents");
            Err(error)
        }
    }

    /// Fetch a document's raw bytes. The response body is a byte stream the
    /// caller drains into staging.
    pub async fn fetch(&self, name: &str) -> Result<reqwest::Response, SourceError> {
        let response = self.client.get(self.document_url(name)).send().await?;

        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = SourceError::UnexpectedStatus { status, body };
            tracing::error!(document = name, error = %error, "Failed to fetch source document");
            Err(error)
        }
    }

    /// Ask the source to purge every document older than `cutoff`.
    pub async fn purge_older_than(&self, cutoff: OffsetDateTime) -> Result<(), SourceError> {
        let cursor = cutoff.format(&Rfc3339)?;
        let response = self
            .client
            .delete(format_endpoint(&self.base_url, "documents"))
            .query(&[("before", cursor.as_str())])
            .send()
            .await?;

        if response.status().is_success() {
            tracing::debug!(before = %cursor, "Source purge acknowledged");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = SourceError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Source purge request failed");
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::DELETE, Method::GET, MockServer};
    use serde_json::json;
    use time::macros::datetime;

    #[tokio::test]
    async fn list_since_sends_cursor_and_parses_names() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/documents")
                    .query_param("since", "2024-05-01T00:00:00Z");
                then.status(200).json_body(json!({
                    "documents": [{ "name": "a.pdf" }, { "name": "b.pdf" }]
                }));
            })
            .await;

        let client = DocumentSourceClient::new(&server.base_url()).expect("client");
        let documents = client
            .list_since(datetime!(2024-05-01 00:00:00 UTC))
            .await
            .expect("listing");

        mock.assert();
        let names: Vec<_> = documents.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }

    #[tokio::test]
    async fn purge_sends_delete_with_cutoff() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(DELETE)
                    .path("/documents")
                    .query_param("before", "2024-06-01T00:00:00Z");
                then.status(200);
            })
            .await;

        let client = DocumentSourceClient::new(&server.base_url()).expect("client");
        client
            .purge_older_than(datetime!(2024-06-01 00:00:00 UTC))
            .await
            .expect("purge");

        mock.assert();
    }

    #[tokio::test]
    async fn listing_error_surfaces_status_and_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/documents");
                then.status(503).body("down for maintenance");
            })
            .await;

        let client = DocumentSourceClient::new(&server.base_url()).expect("client");
        let error = client
            .list_since(OffsetDateTime::UNIX_EPOCH)
            .await
            .expect_err("should fail");

        match error {
            SourceError::UnexpectedStatus { status, body } => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(body, "down for maintenance");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
