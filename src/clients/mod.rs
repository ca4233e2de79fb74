//! Thin HTTP client wrappers for the four collaborating services.
//!
//! Each client owns a `reqwest::Client` plus the service base URL taken from
//! [`crate::config::Config`] at construction time. The wrappers translate the
//! request/response contracts only; service internals are opaque to the
//! pipeline.

mod blob;
mod convert;
mod index;
mod source;

pub use blob::{BlobClient, BlobError, BlobRecord};
pub use convert::{ConvertError, ConverterClient};
pub use index::{IndexClient, IndexError, IndexRecord};
pub use source::{DocumentRef, DocumentSourceClient, SourceError};

pub(crate) fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

pub(crate) fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

pub(crate) fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(concat!("harvester/", env!("CARGO_PKG_VERSION")))
        .build()
}
