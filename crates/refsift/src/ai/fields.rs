//! Candidate-field extraction from message text plus optional resume text.
//!
//! The service replies with a fixed JSON schema using the literal string
//! "Not found" for missing values. Everything it returns is treated as
//! untrusted: strings are trimmed and sentinel-checked, the email must look
//! like an address, and years of experience must land in a plausible range.
//! A field that fails validation is left unset, never propagated as junk.

use std::sync::Arc;

use log::debug;
use regex::Regex;
use serde::Deserialize;

use crate::error::AiError;
use crate::record::CandidateRecord;

use super::{call_with_retries, extract_json, LanguageModel, PromptTemplate, RetryPolicy};

/// Resume text beyond this many characters adds cost without adding signal;
/// the head of a resume carries the identity and experience sections.
const MAX_RESUME_CHARS: usize = 10_000;

const NOT_FOUND_SENTINEL: &str = "not found";

/// Plausibility ceiling for total years of work experience.
const MAX_YEARS_EXPERIENCE: f32 = 80.0;

#[derive(Deserialize)]
struct FieldReply {
    #[serde(default)]
    name: Option<serde_json::Value>,
    #[serde(default)]
    email: Option<serde_json::Value>,
    #[serde(default)]
    phone: Option<serde_json::Value>,
    #[serde(default)]
    years_of_experience: Option<serde_json::Value>,
    #[serde(default)]
    job_id: Option<serde_json::Value>,
    #[serde(default)]
    position: Option<serde_json::Value>,
    #[serde(default)]
    company: Option<serde_json::Value>,
}

pub struct FieldExtractor {
    model: Arc<dyn LanguageModel>,
    retry: RetryPolicy,
    email_pattern: Regex,
}

impl FieldExtractor {
    pub fn new(model: Arc<dyn LanguageModel>, retry: RetryPolicy) -> Self {
        Self {
            model,
            retry,
            // Intentionally loose: one '@', no whitespace, a dotted domain.
            // Pattern is a constant; compilation cannot fail.
            email_pattern: Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid pattern"),
        }
    }

    /// Extracts candidate fields for `sender_id`. `resume_text` is `None`
    /// when no resume could be recovered; the message alone is then the only
    /// source.
    pub async fn extract_fields(
        &self,
        message_text: &str,
        resume_text: Option<&str>,
        sender_id: &str,
    ) -> Result<CandidateRecord, AiError> {
        let input = build_input(message_text, resume_text);

        let response = call_with_retries(self.retry, "field extraction", || {
            self.model.complete(PromptTemplate::FieldExtraction, &input)
        })
        .await?;

        let json = extract_json(&response);
        let reply: FieldReply = serde_json::from_str(json)
            .map_err(|e| AiError::ResponseParse(format!("field extraction reply: {}", e)))?;

        let mut record = CandidateRecord::new(sender_id);
        record.name = clean_string(reply.name.as_ref());
        record.email = clean_string(reply.email.as_ref()).filter(|e| {
            let valid = self.email_pattern.is_match(e);
            if !valid {
                debug!("Dropping implausible email value");
            }
            valid
        });
        record.phone = clean_string(reply.phone.as_ref());
        record.years_experience = clean_years(reply.years_of_experience.as_ref());
        record.job_id = clean_string(reply.job_id.as_ref());
        record.position = clean_string(reply.position.as_ref());
        record.company = clean_string(reply.company.as_ref());

        Ok(record)
    }
}

fn build_input(message_text: &str, resume_text: Option<&str>) -> String {
    let mut input = format!("MESSAGE:\n{}", message_text.trim());
    if let Some(resume) = resume_text {
        let truncated: String = resume.chars().take(MAX_RESUME_CHARS).collect();
        input.push_str("\n\nRESUME:\n");
        input.push_str(truncated.trim());
    }
    input
}

/// Normalizes a string-valued field: trimmed, non-empty, and not the
/// "Not found" sentinel in any casing.
fn clean_string(value: Option<&serde_json::Value>) -> Option<String> {
    let text = value?.as_str()?.trim();
    if text.is_empty() || text.eq_ignore_ascii_case(NOT_FOUND_SENTINEL) {
        return None;
    }
    Some(text.to_string())
}

/// Accepts years as a JSON number or a numeric string, rejecting negatives
/// and values past the plausibility ceiling.
fn clean_years(value: Option<&serde_json::Value>) -> Option<f32> {
    let value = value?;
    let years = match value {
        serde_json::Value::Number(n) => n.as_f64()? as f32,
        serde_json::Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || s.eq_ignore_ascii_case(NOT_FOUND_SENTINEL) {
                return None;
            }
            s.parse::<f32>().ok()?
        }
        _ => return None,
    };

    if !years.is_finite() || years < 0.0 || years > MAX_YEARS_EXPERIENCE {
        debug!("Dropping implausible years_of_experience value {}", years);
        return None;
    }
    Some(years)
}
