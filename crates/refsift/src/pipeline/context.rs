use std::path::PathBuf;

use crate::ai::Classification;
use crate::message::RawMessage;
use crate::record::CandidateRecord;
use crate::resume::{ResumeDocument, ResumeReference};

use super::error::PipelineWarning;

/// Accumulated state for one message as it moves through the steps. Each step
/// fills in the fields it owns; later steps read what earlier steps produced.
#[derive(Debug)]
pub struct MessageContext {
    pub message: RawMessage,
    /// Set by the classification step.
    pub classification: Option<Classification>,
    /// Set by the resume step when a candidate document was located.
    pub resume_reference: Option<ResumeReference>,
    /// Set by the resume step when the document was fetched.
    pub resume: Option<ResumeDocument>,
    /// Set by the resume step when the document was persisted.
    pub resume_path: Option<PathBuf>,
    /// Set by the extraction step.
    pub record: Option<CandidateRecord>,
    /// Degradations encountered along the way. The message still completes;
    /// warnings are the audit trail of what was missing.
    pub warnings: Vec<PipelineWarning>,
}

impl MessageContext {
    pub fn new(message: RawMessage) -> Self {
        Self {
            message,
            classification: None,
            resume_reference: None,
            resume: None,
            resume_path: None,
            record: None,
            warnings: Vec::new(),
        }
    }

    pub fn warn(&mut self, warning: PipelineWarning) {
        self.warnings.push(warning);
    }
}
