//! HTTP client wrapper for the search index service.

use crate::clients::{format_endpoint, http_client, normalize_base_url};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use thiserror::Error;

/// Errors returned while interacting with the search index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid index URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Index responded with an unexpected status code.
    #[error("Unexpected index response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from the index.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Searchable record upserted for one harvested document.
#[derive(Debug, Clone, Serialize)]
pub struct IndexRecord {
    /// Content hash of the converted text; the canonical document identity.
    pub id: String,
    /// Document name with its file-extension suffix stripped.
    pub title: String,
    /// Converted plain text.
    pub content: String,
}

/// Lightweight HTTP client upserting document records into the search index.
pub struct IndexClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) collection: String,
}

impl IndexClient {
    /// Construct a new client for the given service base URL and collection.
    pub fn new(base_url: &str, collection: &str) -> Result<Self, IndexError> {
        let base_url = normalize_base_url(base_url).map_err(IndexError::InvalidUrl)?;
        Ok(Self {
            client: http_client()?,
            base_url,
            collection: collection.to_string(),
        })
    }

    /// Upsert a record keyed by its content hash. Re-sending the same record
    /// is idempotent on the service side.
    pub async fn upsert(&self, record: &IndexRecord) -> Result<(), IndexError> {
        let path = format!("collections/{}/documents/{}", self.collection, record.id);
        let response = self
            .client
            .put(format_endpoint(&self.base_url, &path))
            .query(&[("wait", true)])
            .json(record)
            .send()
            .await?;

        if response.status().is_success() {
            tracing::debug!(
                collection = %self.collection,
                id = %record.id,
                title = %record.title,
                "Index record upserted"
            );
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = IndexError::UnexpectedStatus { status, body };
            tracing::error!(id = %record.id, error = %error, "Index upsert failed");
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::PUT, MockServer};
    use serde_json::json;

    #[tokio::test]
    async fn upsert_puts_record_under_content_hash() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/collections/documents/documents/abc123")
                    .query_param("wait", "true")
                    .json_body(json!({
                        "id": "abc123",
                        "title": "report",
                        "content": "body text"
                    }));
                then.status(200);
            })
            .await;

        let client = IndexClient::new(&server.base_url(), "documents").expect("client");
        client
            .upsert(&IndexRecord {
                id: "abc123".into(),
                title: "report".into(),
                content: "body text".into(),
            })
            .await
            .expect("upsert");

        mock.assert();
    }
}
