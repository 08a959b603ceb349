pub mod pdf;

use crate::error::ExtractError;

pub use pdf::PdfTextExtractor;

/// Converts raw document bytes into plain text. Implementations must keep
/// page order and represent unreadable pages as empty segments so that
/// page-indexed consumers stay aligned.
pub trait DocumentTextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError>;
}
