//! Fixed instruction contracts for the language-model service.
//!
//! Inputs are truncated before prompt assembly so a pathological message or
//! resume cannot blow the service's context window.

use super::PromptTemplate;

/// Upper bound on the user-supplied text embedded in any one prompt.
const MAX_INPUT_CHARS: usize = 12_000;

pub(crate) const CLASSIFICATION_SYSTEM: &str = "You are an assistant that analyzes inbox \
messages for job referral requests. A referral request asks the recipient to refer the \
sender for a job opening. Networking chatter, spam, sales outreach, and unrelated content \
are not referral requests. Respond ONLY with valid JSON, no markdown, no extra text.";

pub(crate) const FIELD_EXTRACTION_SYSTEM: &str = "You are an assistant that extracts \
structured candidate information from a referral message and an optional resume. Respond \
ONLY with valid JSON, no markdown formatting or code blocks.";

/// Renders (system, user) content for a template. `input` is the already
/// assembled text payload for the template.
pub(crate) fn render(template: PromptTemplate, input: &str) -> (String, String) {
    let truncated: String = input.chars().take(MAX_INPUT_CHARS).collect();

    match template {
        PromptTemplate::ReferralClassification => (
            CLASSIFICATION_SYSTEM.to_string(),
            format!(
                r#"Determine whether the following message is a job referral request.

Return JSON:
{{"is_referral_request": true/false, "confidence": 0.0-1.0}}

Message:
{}"#,
                truncated
            ),
        ),
        PromptTemplate::FieldExtraction => (
            FIELD_EXTRACTION_SYSTEM.to_string(),
            format!(
                r#"Extract the following fields. Fields explicitly stated in the MESSAGE
(job ID, position, company) take precedence over anything inferred from the
RESUME; the resume is the primary source for name, email, phone, and total
years of work experience (calculate from work history).

Return JSON with exactly these keys, using "Not found" for missing values:
{{"name": "...", "email": "...", "phone": "...", "years_of_experience": 0,
"job_id": "...", "position": "...", "company": "..."}}

{}"#,
                truncated
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_prompt_carries_message() {
        let (system, user) = render(
            PromptTemplate::ReferralClassification,
            "Can you refer me for Job ID 12345?",
        );
        assert!(system.contains("referral"));
        assert!(user.contains("Job ID 12345"));
        assert!(user.contains("is_referral_request"));
    }

    #[test]
    fn test_field_prompt_names_all_schema_keys() {
        let (_, user) = render(PromptTemplate::FieldExtraction, "MESSAGE:\nhi\n\nRESUME:\ncv");
        for key in [
            "name",
            "email",
            "phone",
            "years_of_experience",
            "job_id",
            "position",
            "company",
        ] {
            assert!(user.contains(key), "missing key {}", key);
        }
    }

    #[test]
    fn test_oversized_input_truncated() {
        let huge = "x".repeat(50_000);
        let (_, user) = render(PromptTemplate::ReferralClassification, &huge);
        assert!(user.chars().count() < 13_000);
    }
}
