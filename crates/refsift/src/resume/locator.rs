//! Decides where a message's resume lives.

use log::debug;
use regex::Regex;

use crate::message::{Attachment, RawMessage};

use super::fetcher;
use super::ResumeReference;

/// Candidate sharing-link pattern scanned for in message text. Matches are
/// validated against the fetcher's URL contract before being selected.
const DRIVE_LINK_PATTERN: &str = r"https://drive\.google\.com/[^\s<>\)\]]+";

pub struct ResumeLocator {
    link_pattern: Regex,
}

impl Default for ResumeLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl ResumeLocator {
    pub fn new() -> Self {
        Self {
            // Pattern is a constant; compilation cannot fail.
            link_pattern: Regex::new(DRIVE_LINK_PATTERN).expect("valid link pattern"),
        }
    }

    /// Selects at most one resume reference for the message.
    ///
    /// Attachments are scanned first, in order; the first one matching the
    /// document signature wins and no further scanning happens. Only when no
    /// attachment matches is the message text scanned for a recognized
    /// sharing link. `None` means the message simply carries no resume.
    pub fn locate(&self, message: &RawMessage) -> Option<ResumeReference> {
        for attachment in &message.attachments {
            if is_document_attachment(attachment) {
                debug!("Selected attachment '{}' as resume", attachment.filename);
                return Some(ResumeReference::Attachment {
                    filename: attachment.filename.clone(),
                });
            }
        }

        for candidate in self.link_pattern.find_iter(&message.text) {
            let url = candidate.as_str();
            if fetcher::file_id_from_url(url).is_some() {
                debug!("Selected external link '{}' as resume", url);
                return Some(ResumeReference::ExternalLink {
                    url: url.to_string(),
                });
            }
        }

        None
    }
}

/// Document signature check: declared MIME type first, filename-derived type
/// as fallback for sources that report `application/octet-stream`.
fn is_document_attachment(attachment: &Attachment) -> bool {
    // Declared types may carry parameters, e.g. `application/pdf; name="cv.pdf"`.
    let essence = attachment
        .mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim();
    if essence.eq_ignore_ascii_case("application/pdf") {
        return true;
    }

    mime_guess::from_path(&attachment.filename)
        .first()
        .map(|mime| mime.essence_str() == "application/pdf")
        .unwrap_or(false)
}
