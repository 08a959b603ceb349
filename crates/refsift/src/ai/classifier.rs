//! Referral-request classification over the language-model boundary.

use std::sync::Arc;

use log::debug;
use serde::Deserialize;

use crate::error::AiError;

use super::{call_with_retries, extract_json, LanguageModel, PromptTemplate, RetryPolicy};

/// Classifier verdict for one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub is_referral: bool,
    /// Model-reported confidence in `0.0..=1.0`; absent when the model did
    /// not provide one or provided one out of range.
    pub confidence: Option<f32>,
}

impl Classification {
    pub fn not_referral() -> Self {
        Self {
            is_referral: false,
            confidence: None,
        }
    }
}

#[derive(Deserialize)]
struct ClassifierReply {
    is_referral_request: bool,
    #[serde(default)]
    confidence: Option<f32>,
}

pub struct ReferralClassifier {
    model: Arc<dyn LanguageModel>,
    retry: RetryPolicy,
}

impl ReferralClassifier {
    pub fn new(model: Arc<dyn LanguageModel>, retry: RetryPolicy) -> Self {
        Self { model, retry }
    }

    /// Classifies one message body. Empty or whitespace-only text is never a
    /// referral request and short-circuits without a service call.
    ///
    /// Unparseable responses fail closed: the message is treated as not a
    /// referral rather than surfacing an error.
    pub async fn classify(&self, text: &str) -> Result<Classification, AiError> {
        if text.trim().is_empty() {
            return Ok(Classification::not_referral());
        }

        let response = call_with_retries(self.retry, "classification", || {
            self.model
                .complete(PromptTemplate::ReferralClassification, text)
        })
        .await?;

        Ok(parse_classification(&response))
    }
}

fn parse_classification(response: &str) -> Classification {
    let json = extract_json(response);
    if let Ok(reply) = serde_json::from_str::<ClassifierReply>(json) {
        let confidence = reply
            .confidence
            .filter(|c| (0.0..=1.0).contains(c) && c.is_finite());
        return Classification {
            is_referral: reply.is_referral_request,
            confidence,
        };
    }

    // Some models answer with a bare affirmative despite the JSON contract.
    if let Some(line) = response.lines().find(|l| !l.trim().is_empty()) {
        let word = line
            .trim()
            .trim_end_matches(['.', '!'])
            .to_ascii_lowercase();
        match word.as_str() {
            "yes" | "true" => {
                return Classification {
                    is_referral: true,
                    confidence: None,
                }
            }
            "no" | "false" => return Classification::not_referral(),
            _ => {}
        }
    }

    debug!("Unparseable classifier response; treating as not a referral");
    Classification::not_referral()
}
