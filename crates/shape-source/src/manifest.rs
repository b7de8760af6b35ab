//! `sha256sum`-style checksum manifests.
//!
//! Each non-empty line is `<hex digest>  <file name>`, the format written by
//! `sha256sum`. A leading `*` on the file name (binary mode) is ignored.

use std::path::Path;

use tracing::debug;

use crate::error::{Result, SourceError};
use crate::hash::{compute_file_sha256, normalize_checksum};

/// One line of a checksum manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub checksum: String,
    pub file: String,
}

/// Parse manifest lines. Returns `None` when the content is not a manifest.
pub fn parse_manifest(content: &str) -> Option<Vec<ManifestEntry>> {
    let mut entries = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (digest, file) = line.split_once(char::is_whitespace)?;
        let checksum = normalize_checksum(digest).ok()?;
        let file = file.trim_start().trim_start_matches('*');
        if file.is_empty() {
            return None;
        }
        entries.push(ManifestEntry {
            checksum,
            file: file.to_string(),
        });
    }
    if entries.is_empty() { None } else { Some(entries) }
}

/// Re-hash every file listed in the manifest under `dir`.
pub fn verify_manifest(source_id: &str, dir: &Path, entries: &[ManifestEntry]) -> Result<()> {
    for entry in entries {
        let path = dir.join(&entry.file);
        if !path.is_file() {
            return Err(SourceError::SourceNotFound {
                location: path.display().to_string(),
            });
        }
        let computed = compute_file_sha256(&path)?;
        if computed != entry.checksum {
            return Err(SourceError::ChecksumMismatch {
                source_id: format!("{source_id}/{}", entry.file),
                expected: entry.checksum.clone(),
                computed,
                stated: None,
            });
        }
        debug!(source_id, part = %entry.file, "part checksum verified");
    }
    Ok(())
}
