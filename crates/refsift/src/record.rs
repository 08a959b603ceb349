//! The pipeline's output unit.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A validated, deduplicated referral record.
///
/// Every optional field may legitimately be unset: a record carrying nothing
/// but `sender_id` is still valid and still gets emitted. Empty strings are
/// normalized to unset at construction so that the merge rule never has to
/// distinguish "empty" from "missing".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    /// Carried through from the message for dedup and traceability.
    pub sender_id: String,
    /// Present only when explicitly stated in the message.
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Non-negative; values above 80 are rejected upstream as absurd.
    #[serde(default)]
    pub years_experience: Option<f32>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    /// Path of the persisted resume file, unset when no resume was recovered.
    #[serde(default)]
    pub resume_path: Option<PathBuf>,
}

impl CandidateRecord {
    /// A record with only the sender identity set.
    pub fn new(sender_id: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            job_id: None,
            name: None,
            email: None,
            phone: None,
            years_experience: None,
            position: None,
            company: None,
            resume_path: None,
        }
    }

    /// Fills fields that are unset on `self` from `newer`. Set fields are
    /// never overwritten, so a later message can only add information.
    pub fn fill_missing_from(&mut self, newer: &CandidateRecord) {
        fill(&mut self.job_id, &newer.job_id);
        fill(&mut self.name, &newer.name);
        fill(&mut self.email, &newer.email);
        fill(&mut self.phone, &newer.phone);
        fill(&mut self.years_experience, &newer.years_experience);
        fill(&mut self.position, &newer.position);
        fill(&mut self.company, &newer.company);
        fill(&mut self.resume_path, &newer.resume_path);
    }

    /// True when no optional field carries a value.
    pub fn is_bare(&self) -> bool {
        self.job_id.is_none()
            && self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.years_experience.is_none()
            && self.position.is_none()
            && self.company.is_none()
            && self.resume_path.is_none()
    }
}

fn fill<T: Clone>(slot: &mut Option<T>, newer: &Option<T>) {
    if slot.is_none() {
        if let Some(value) = newer {
            *slot = Some(value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_record_is_valid() {
        let record = CandidateRecord::new("s1");
        assert!(record.is_bare());
        assert_eq!(record.sender_id, "s1");
    }

    #[test]
    fn test_fill_missing_only_fills_unset() {
        let mut existing = CandidateRecord::new("s1");
        existing.email = Some("a@example.com".to_string());
        existing.years_experience = Some(4.0);

        let mut newer = CandidateRecord::new("s1");
        newer.email = Some("b@example.com".to_string());
        newer.phone = Some("+41790000000".to_string());

        existing.fill_missing_from(&newer);

        // Set field untouched, unset field filled
        assert_eq!(existing.email.as_deref(), Some("a@example.com"));
        assert_eq!(existing.phone.as_deref(), Some("+41790000000"));
        assert_eq!(existing.years_experience, Some(4.0));
    }

    #[test]
    fn test_fill_missing_with_bare_record_is_noop() {
        let mut existing = CandidateRecord::new("s1");
        existing.name = Some("Ada".to_string());
        let before = existing.clone();

        existing.fill_missing_from(&CandidateRecord::new("s1"));
        assert_eq!(existing, before);
    }

    #[test]
    fn test_serde_camel_case() {
        let mut record = CandidateRecord::new("s1");
        record.job_id = Some("12345".to_string());

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"senderId\""));
        assert!(json.contains("\"jobId\":\"12345\""));

        let back: CandidateRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
