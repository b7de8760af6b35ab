//! `source.toml` metadata for directory sources.
//!
//! ```toml
//! [metadata]
//! id = "isaric-demo"
//! n = 10
//! checksum = "03cc8e28..."
//! checksum_file = "sha256sums.txt"
//! description = "Synthetic ISARIC cohort"
//! primary_part = "patient"
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, SourceError};

/// Metadata file name inside a source directory.
pub const METADATA_FILE: &str = "source.toml";

/// Part whose row count stands in for a missing `n`.
pub const DEFAULT_PRIMARY_PART: &str = "patient";

#[derive(Debug, Deserialize)]
struct MetadataFile {
    metadata: SourceMetadata,
}

/// The `[metadata]` table of a source directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceMetadata {
    #[serde(default)]
    pub id: Option<String>,
    /// Number of primary records, when the administrator recorded it.
    #[serde(default)]
    pub n: Option<u64>,
    /// Checksum stated by the data administrator.
    pub checksum: String,
    /// File the digest is computed over, relative to the source directory.
    pub checksum_file: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_primary_part")]
    pub primary_part: String,
}

fn default_primary_part() -> String {
    DEFAULT_PRIMARY_PART.to_string()
}

impl SourceMetadata {
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self> {
        let file: MetadataFile = toml::from_str(content).map_err(|e| SourceError::Metadata {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(file.metadata)
    }

    /// Read the metadata file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SourceError::io(path, e))?;
        Self::from_toml_str(&content, path)
    }
}
