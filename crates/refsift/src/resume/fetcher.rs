//! External-link retrieval.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use regex::Regex;

use crate::error::FetchError;

/// Maximum length for error bodies echoed into messages, to keep logs sane.
const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Network boundary for resume links. Implementations retrieve the raw bytes
/// behind a sharing URL or fail with a `FetchError`; the pipeline degrades
/// every failure to NoResume.
#[async_trait]
pub trait LinkFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Extracts the file id from a recognized sharing URL.
///
/// Two viewer forms are understood:
/// - `https://drive.google.com/file/d/<ID>/view...`
/// - `https://drive.google.com/open?id=<ID>`
pub fn file_id_from_url(url: &str) -> Option<String> {
    if !url.contains("drive.google.com") {
        return None;
    }

    // Patterns are constants; compilation cannot fail.
    let file_d = Regex::new(r"/file/d/([A-Za-z0-9_-]+)").expect("valid pattern");
    if let Some(caps) = file_d.captures(url) {
        return Some(caps[1].to_string());
    }

    let id_param = Regex::new(r"[?&]id=([A-Za-z0-9_-]+)").expect("valid pattern");
    id_param.captures(url).map(|caps| caps[1].to_string())
}

/// Rewrites a viewer URL to its direct-download form. Exactly one rewrite
/// hop; the result is fetched as-is.
pub fn direct_download_url(file_id: &str) -> String {
    format!(
        "https://drive.google.com/uc?export=download&id={}",
        file_id
    )
}

/// Document signature check on retrieved bytes. A permission interstitial or
/// an image served where a resume was expected fails this.
pub fn is_pdf_bytes(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

fn truncate_body(body: &str) -> String {
    // Cut on a char boundary; error pages are not always ASCII.
    match body.char_indices().nth(MAX_ERROR_BODY_LENGTH) {
        Some((idx, _)) => format!("{}... (truncated)", &body[..idx]),
        None => body.to_string(),
    }
}

/// reqwest-backed fetcher with a bounded per-request timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Unreachable(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl LinkFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let file_id = file_id_from_url(url).ok_or_else(|| {
            FetchError::Unreachable(format!("unrecognized sharing link format: {}", url))
        })?;

        let download_url = direct_download_url(&file_id);
        debug!("Fetching resume via {}", download_url);

        let response = self
            .client
            .get(&download_url)
            .send()
            .await
            .map_err(|e| FetchError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FetchError::AccessDenied {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Unreachable(format!(
                "HTTP {} from '{}': {}",
                status.as_u16(),
                download_url,
                truncate_body(&body)
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Unreachable(e.to_string()))?;

        if !is_pdf_bytes(&bytes) {
            return Err(FetchError::NotADocument(url.to_string()));
        }

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id_from_viewer_url() {
        let id = file_id_from_url("https://drive.google.com/file/d/1AbC_d-3/view?usp=sharing");
        assert_eq!(id.as_deref(), Some("1AbC_d-3"));
    }

    #[test]
    fn test_file_id_from_open_url() {
        let id = file_id_from_url("https://drive.google.com/open?id=XYZ_123-a");
        assert_eq!(id.as_deref(), Some("XYZ_123-a"));
    }

    #[test]
    fn test_file_id_rejects_other_hosts() {
        assert!(file_id_from_url("https://example.com/file/d/abc/view").is_none());
    }

    #[test]
    fn test_file_id_rejects_unrecognized_drive_paths() {
        assert!(file_id_from_url("https://drive.google.com/drive/my-drive").is_none());
    }

    #[test]
    fn test_direct_download_rewrite() {
        assert_eq!(
            direct_download_url("abc123"),
            "https://drive.google.com/uc?export=download&id=abc123"
        );
    }

    #[test]
    fn test_pdf_signature() {
        assert!(is_pdf_bytes(b"%PDF-1.7 rest of file"));
        assert!(!is_pdf_bytes(b"\x89PNG\r\n"));
        assert!(!is_pdf_bytes(b"<!DOCTYPE html><html>permission denied"));
        assert!(!is_pdf_bytes(b""));
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(500);
        let truncated = truncate_body(&long);
        assert!(truncated.len() < long.len());
        assert!(truncated.ends_with("(truncated)"));

        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn test_truncate_body_multibyte() {
        // Byte 200 falls mid-character; the cut must land on a boundary.
        let long = "日".repeat(300);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("(truncated)"));
        assert_eq!(truncated.chars().filter(|c| *c == '日').count(), 200);

        // Exactly at the limit: returned unchanged.
        let exact = "日".repeat(200);
        assert_eq!(truncate_body(&exact), exact);
    }
}
