//! Language-model service boundary.
//!
//! The pipeline never talks to a vendor SDK directly: everything goes through
//! the `LanguageModel` trait, so deterministic test doubles slot in without
//! touching pipeline logic. The crate owns all parsing and validation of the
//! raw text the service returns.

pub mod classifier;
pub mod client;
pub mod fields;
pub mod prompts;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use log::warn;

use crate::error::AiError;

pub use classifier::{Classification, ReferralClassifier};
pub use client::{AiClient, AiClientConfig};
pub use fields::FieldExtractor;

/// Prompt templates understood by the service boundary. The raw response is
/// always free-form text; callers parse it themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTemplate {
    /// "Is this message a job-referral request?" — strict yes/no contract.
    ReferralClassification,
    /// Structured candidate-field extraction with a fixed schema.
    FieldExtraction,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, template: PromptTemplate, input: &str) -> Result<String, AiError>;
}

/// Bounded retry with exponential backoff for transient service failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(500),
        }
    }
}

/// Runs `call` until it succeeds, fails non-transiently, or exhausts the
/// policy's attempt budget. Backoff doubles per attempt.
pub(crate) async fn call_with_retries<T, F, Fut>(
    policy: RetryPolicy,
    operation: &str,
    mut call: F,
) -> Result<T, AiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AiError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let delay = policy.base_backoff * 2u32.saturating_pow(attempt - 1);
                warn!(
                    "{} attempt {}/{} failed ({}); retrying in {:?}",
                    operation, attempt, max_attempts, e, delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Extracts the first balanced JSON object from a free-form response,
/// tracking string boundaries and escape sequences so braces inside string
/// values don't confuse the scan. Returns the input unchanged when no
/// object start is found.
pub(crate) fn extract_json(response: &str) -> &str {
    let start = match response.find('{') {
        Some(idx) => idx,
        None => return response,
    };

    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;
    let mut end = response.len();

    for (i, c) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    end = start + i + 1;
                    break;
                }
            }
            _ => {}
        }
    }

    &response[start..end]
}
