use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RefsiftError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Resume fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Document extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("AI service error: {0}")]
    Ai(#[from] AiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

/// Failures while retrieving a located resume. Every variant degrades to
/// NoResume at the pipeline level; none aborts the message.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Link unreachable: {0}")]
    Unreachable(String),

    #[error("Access denied fetching '{url}' (HTTP {status})")]
    AccessDenied { url: String, status: u16 },

    #[error("Content behind '{0}' is not a document")]
    NotADocument(String),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unreadable document: {0}")]
    UnreadableDocument(String),
}

/// Errors from the external language-model service boundary.
#[derive(Error, Debug)]
pub enum AiError {
    #[error("Transient service failure: {0}")]
    Transient(String),

    #[error("AI service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("AI service returned an empty response")]
    EmptyResponse,

    #[error("Failed to parse AI response: {0}")]
    ResponseParse(String),

    #[error("Credentials not found: environment variable '{0}' is not set")]
    CredentialsNotFound(String),
}

impl AiError {
    /// Transient failures are retried; everything else fails fast.
    /// 429 and 5xx responses count as transient (rate limits, server hiccups).
    pub fn is_transient(&self) -> bool {
        match self {
            AiError::Transient(_) => true,
            AiError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, RefsiftError>;
