//! Resume location, retrieval, and persistence.

pub mod fetcher;
pub mod locator;
pub mod store;

pub use fetcher::{is_pdf_bytes, HttpFetcher, LinkFetcher};
pub use locator::ResumeLocator;
pub use store::ResumeStore;

/// A located-but-not-yet-fetched resume. At most one is selected per message:
/// the first matching attachment wins over any external link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeReference {
    /// Resume travels as a message attachment.
    Attachment { filename: String },
    /// Resume sits behind a recognized file-hosting link.
    ExternalLink { url: String },
}

/// Fetched resume content.
#[derive(Debug, Clone)]
pub struct ResumeDocument {
    /// Raw document bytes.
    pub bytes: Vec<u8>,
    /// Plain text extracted from the document. Empty when extraction failed;
    /// empty is a valid terminal state, not an error.
    pub extracted_text: String,
}
