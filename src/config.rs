use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the harvester service.
///
/// Built once during startup and passed by reference into the clients and the
/// pipeline service; there is no process-wide configuration global.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the document source service.
    pub source_url: String,
    /// Base URL of the PDF-to-text converter service.
    pub converter_url: String,
    /// Base URL of the search index service.
    pub index_url: String,
    /// Name of the index collection that receives document upserts.
    pub index_collection: String,
    /// Base URL of the binary blob store.
    pub blob_url: String,
    /// Directory holding per-document staging artifacts.
    pub staging_dir: PathBuf,
    /// Marker file recording the last successful batch start time.
    pub watermark_file: PathBuf,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let staging_dir =
            PathBuf::from(load_env_optional("STAGING_DIR").unwrap_or_else(|| "staging".into()));
        let watermark_file = load_env_optional("WATERMARK_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| staging_dir.join(".watermark"));
        Ok(Self {
            source_url: load_env("SOURCE_URL")?,
            converter_url: load_env("CONVERTER_URL")?,
            index_url: load_env("INDEX_URL")?,
            index_collection: load_env_optional("INDEX_COLLECTION")
                .unwrap_or_else(|| "documents".into()),
            blob_url: load_env("BLOB_URL")?,
            staging_dir,
            watermark_file,
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
