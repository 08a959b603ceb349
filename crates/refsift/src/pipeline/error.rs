use thiserror::Error;

/// Non-fatal degradations recorded against a message. Every variant leaves
/// the message processable; the pipeline continues with reduced information.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineWarning {
    #[error("Classifier unavailable: {reason}")]
    ClassifierUnavailable { reason: String },

    #[error("Resume fetch failed for '{locator}': {reason}")]
    ResumeFetchFailed { locator: String, reason: String },

    #[error("Resume content unreadable: {reason}")]
    ResumeUnreadable { reason: String },

    #[error("Resume could not be saved: {reason}")]
    ResumeSaveFailed { reason: String },

    #[error("Field extraction failed: {reason}")]
    FieldExtractionFailed { reason: String },
}
