//! HTTP client for an Azure-style chat-completions service.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::error::AiError;

use super::{prompts, LanguageModel, PromptTemplate};

/// Maximum length for error bodies echoed into messages, to keep logs sane
/// and to avoid leaking request payloads wholesale.
const MAX_ERROR_BODY_LENGTH: usize = 200;

fn truncate_body(body: &str) -> String {
    // Cut on a char boundary; error pages are not always ASCII.
    match body.char_indices().nth(MAX_ERROR_BODY_LENGTH) {
        Some((idx, _)) => format!("{}... (truncated)", &body[..idx]),
        None => body.to_string(),
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiClientConfig {
    /// Service base URL, e.g. `https://myresource.openai.azure.com`.
    pub endpoint: String,
    /// Deployment (model) name addressed in the URL path.
    pub deployment: String,
    pub api_version: String,
    /// Name of the environment variable holding the API key. The key itself
    /// never appears in config files.
    pub api_key_env_var: String,
    pub request_timeout_secs: u64,
    /// Global cap on in-flight requests against the service.
    pub max_concurrent_requests: usize,
}

impl Default for AiClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            deployment: "gpt-4o".to_string(),
            api_version: "2024-02-15-preview".to_string(),
            api_key_env_var: "REFSIFT_AI_API_KEY".to_string(),
            request_timeout_secs: 60,
            max_concurrent_requests: 2,
        }
    }
}

impl AiClientConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.trim().is_empty() {
            return Err("ai.endpoint must not be empty".to_string());
        }
        if self.deployment.trim().is_empty() {
            return Err("ai.deployment must not be empty".to_string());
        }
        if self.max_concurrent_requests == 0 {
            return Err("ai.maxConcurrentRequests must be at least 1".to_string());
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Production `LanguageModel` implementation. One instance is shared across
/// the pipeline; the semaphore enforces the global cap on in-flight requests
/// so a large batch cannot trip the service's rate limits.
pub struct AiClient {
    http: reqwest::Client,
    config: AiClientConfig,
    api_key: SecretString,
    limiter: Arc<Semaphore>,
}

impl AiClient {
    /// Builds a client, resolving the API key from the configured
    /// environment variable.
    pub fn new(config: AiClientConfig) -> Result<Self, AiError> {
        let api_key = std::env::var(&config.api_key_env_var)
            .map(SecretString::from)
            .map_err(|_| AiError::CredentialsNotFound(config.api_key_env_var.clone()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AiError::Transient(format!("failed to build HTTP client: {}", e)))?;

        let limiter = Arc::new(Semaphore::new(config.max_concurrent_requests.max(1)));

        Ok(Self {
            http,
            config,
            api_key,
            limiter,
        })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.deployment,
            self.config.api_version
        )
    }
}

#[async_trait]
impl LanguageModel for AiClient {
    async fn complete(&self, template: PromptTemplate, input: &str) -> Result<String, AiError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| AiError::Transient("concurrency limiter closed".to_string()))?;

        let (system, user) = prompts::render(template, input);
        let body = ChatRequest {
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: 0.1,
        };

        let url = self.completions_url();
        debug!("Calling AI service for {:?}", template);

        let response = self
            .http
            .post(&url)
            .header("api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Transient(format!("request timed out: {}", e))
                } else {
                    AiError::Transient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Http {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::ResponseParse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AiError::EmptyResponse)
    }
}
