//! Runtime configuration, loaded from a JSON file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::ai::{AiClientConfig, RetryPolicy};
use crate::error::ConfigError;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub ai: AiClientConfig,
}

impl Config {
    /// Loads and validates configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::ReadFile {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;

        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pipeline.validate()?;
        self.ai
            .validate()
            .map_err(|message| ConfigError::Validation { message })?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// Directory where recovered resumes are persisted.
    pub resumes_directory: PathBuf,
    /// Timeout for a single external link fetch.
    pub fetch_timeout_secs: u64,
    /// Attempt budget per language-model call (first try included).
    pub max_ai_attempts: u32,
    /// Base backoff before the first retry; doubles per attempt.
    pub retry_backoff_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            resumes_directory: PathBuf::from("resumes"),
            fetch_timeout_secs: 30,
            max_ai_attempts: 3,
            retry_backoff_ms: 500,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resumes_directory.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                message: "pipeline.resumesDirectory must not be empty".to_string(),
            });
        }
        if self.max_ai_attempts == 0 {
            return Err(ConfigError::Validation {
                message: "pipeline.maxAiAttempts must be at least 1".to_string(),
            });
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::Validation {
                message: "pipeline.fetchTimeoutSecs must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_ai_attempts,
            base_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
