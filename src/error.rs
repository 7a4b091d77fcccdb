use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DigestError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing required setting {setting}")]
    Configuration { setting: &'static str },

    #[error("{service} error (status {status}): {message}")]
    RemoteService {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("Malformed record {key}: missing field `{field}`")]
    MalformedRecord { key: String, field: &'static str },

    #[error("Failed to read config file at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Upload of {0} returned no file handle")]
    MissingFileHandle(String),

    #[error("Date out of range: {0}")]
    DateOutOfRange(String),

    #[error("Refusing to {0} without --yes")]
    Unconfirmed(&'static str),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Failed to encode chart description: {0}")]
    ChartEncode(#[from] serde_json::Error),
}

impl DigestError {
    pub fn missing(setting: &'static str) -> Self {
        DigestError::Configuration { setting }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, DigestError::Configuration { .. })
    }
}

pub type Result<T> = std::result::Result<T, DigestError>;
