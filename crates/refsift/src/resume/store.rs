//! Persistence of fetched resumes.

use std::path::{Path, PathBuf};

use log::debug;

use crate::error::StorageError;

/// Local resume file store. Filenames derive from the sender identity, so
/// re-processing the same sender overwrites rather than duplicates —
/// persistence is at-least-once and needs no locking.
pub struct ResumeStore {
    root: PathBuf,
}

impl ResumeStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the resume bytes and returns the persisted path. Idempotent:
    /// a repeat save for the same sender lands on the same path.
    pub fn save(
        &self,
        sender_id: &str,
        bytes: &[u8],
        extension: &str,
    ) -> Result<PathBuf, StorageError> {
        std::fs::create_dir_all(&self.root).map_err(|e| StorageError::CreateDirectory {
            path: self.root.clone(),
            source: e,
        })?;

        let filename = format!("{}_resume.{}", sanitize_component(sender_id), extension);
        let path = self.root.join(filename);

        debug!("Saving resume to {}", path.display());
        std::fs::write(&path, bytes).map_err(|e| StorageError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        Ok(path)
    }
}

/// Reduces an opaque sender id to a safe filename component.
fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        "sender".to_string()
    } else {
        // Bound length; sender ids are opaque and can be long
        trimmed.chars().take(120).collect()
    }
}
