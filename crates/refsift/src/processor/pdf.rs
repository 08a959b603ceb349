use crate::error::ExtractError;

use super::DocumentTextExtractor;

/// PDF text extraction via lopdf.
///
/// Pages are visited in document order and joined with exactly one newline
/// between consecutive pages: a 3-page document always yields 2 separator
/// boundaries, even when a page is blank. A page that yields no text
/// contributes an empty segment rather than being skipped.
pub struct PdfTextExtractor;

impl DocumentTextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        let _span = tracing::info_span!("processor.pdf").entered();

        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| ExtractError::UnreadableDocument(format!("failed to load PDF: {}", e)))?;

        if doc.is_encrypted() {
            return Err(ExtractError::UnreadableDocument(
                "document is encrypted".to_string(),
            ));
        }

        let pages = doc.get_pages();
        let mut segments: Vec<String> = Vec::with_capacity(pages.len());

        for (page_num, _) in pages {
            let segment = doc
                .extract_text(&[page_num])
                .map(|text| text.trim_end().to_string())
                .unwrap_or_default();
            segments.push(segment);
        }

        Ok(segments.join("\n"))
    }
}
