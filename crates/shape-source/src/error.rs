//! Error types for source loading.

use std::path::PathBuf;

use shape_map::MapError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// Directory, file, metadata, checksum file or catalog entry is absent.
    #[error("source not found: {location}")]
    SourceNotFound { location: String },

    /// Recomputed digest disagrees with the expected (or stated) checksum.
    #[error(
        "checksum validation failed for '{source_id}': expected {expected}, computed {computed}{}",
        stated_suffix(stated)
    )]
    ChecksumMismatch {
        source_id: String,
        expected: String,
        computed: String,
        /// Checksum recorded in the source metadata, when there is one.
        stated: Option<String>,
    },

    #[error("invalid checksum '{value}': expected 64 hexadecimal characters")]
    InvalidChecksum { value: String },

    #[error("data at path={} missing part={part}", path.display())]
    PartNotFound { path: PathBuf, part: String },

    #[error("invalid source metadata {}: {message}", path.display())]
    Metadata { path: PathBuf, message: String },

    #[error("invalid source catalog {}: {message}", path.display())]
    Catalog { path: PathBuf, message: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A part file could not be parsed into a dataframe.
    #[error("failed to read part {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error(transparent)]
    Map(#[from] MapError),
}

fn stated_suffix(stated: &Option<String>) -> String {
    stated
        .as_deref()
        .map(|s| format!(", stated {s}"))
        .unwrap_or_default()
}

impl SourceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::SourceNotFound {
                location: path.display().to_string(),
            }
        } else {
            Self::Io { path, source }
        }
    }
}

pub type Result<T> = std::result::Result<T, SourceError>;
