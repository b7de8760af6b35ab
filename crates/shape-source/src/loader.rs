//! Source resolution and checksum verification.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use shape_model::Provenance;
use tracing::{debug, info, warn};

use crate::catalog::SourceCatalog;
use crate::error::{Result, SourceError};
use crate::hash::{compute_file_sha256, normalize_checksum, sha256_hex};
use crate::manifest::{parse_manifest, verify_manifest};
use crate::metadata::{METADATA_FILE, SourceMetadata};
use crate::parts::{count_rows, find_part};

/// Where a source comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocator {
    /// A source directory (with `source.toml`) or a single tabular file.
    Path(PathBuf),
    /// An identifier looked up in the loader's [`SourceCatalog`].
    Named(String),
    /// Bytes already in memory, treated as one CSV part named `id`.
    InMemory { id: String, bytes: Vec<u8> },
}

impl SourceLocator {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn named(id: impl Into<String>) -> Self {
        Self::Named(id.into())
    }

    pub fn in_memory(id: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::InMemory {
            id: id.into(),
            bytes: bytes.into(),
        }
    }
}

/// Options for [`SourceLoader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LoadOptions {
    /// Re-hash every part listed in a `sha256sum`-style checksum file.
    /// On by default; switching it off trusts the parts once the checksum
    /// file itself matched.
    #[serde(default = "default_verify_parts")]
    pub verify_parts: bool,
}

fn default_verify_parts() -> bool {
    true
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            verify_parts: default_verify_parts(),
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_verify_parts(mut self, verify: bool) -> Self {
        self.verify_parts = verify;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Directory of per-resource parts.
    Directory,
    /// One tabular file.
    File,
    /// In-memory CSV bytes.
    InMemory,
}

/// A verified data source.
///
/// Only the loader constructs sources, and only after the recomputed digest
/// matched the caller's expected checksum.
#[derive(Clone)]
pub struct Source {
    provenance: Arc<Provenance>,
    kind: SourceKind,
    path: Option<PathBuf>,
    checksum_file: Option<PathBuf>,
    primary_part: String,
    bytes: Option<Arc<[u8]>>,
}

impl Source {
    pub(crate) fn new(
        provenance: Provenance,
        kind: SourceKind,
        path: Option<PathBuf>,
        checksum_file: Option<PathBuf>,
        primary_part: String,
    ) -> Self {
        Self {
            provenance: Arc::new(provenance),
            kind,
            path,
            checksum_file,
            primary_part,
            bytes: None,
        }
    }

    fn with_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.bytes = Some(Arc::from(bytes));
        self
    }

    pub fn id(&self) -> &str {
        &self.provenance.source_id
    }

    /// Lower-case hex SHA-256 verified at load time.
    pub fn checksum(&self) -> &str {
        &self.provenance.checksum
    }

    pub fn record_count(&self) -> u64 {
        self.provenance.record_count
    }

    pub fn description(&self) -> Option<&str> {
        self.provenance.description.as_deref()
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Resolved location; `None` for in-memory sources.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// File the digest was computed over; `None` for in-memory sources.
    pub fn checksum_file(&self) -> Option<&Path> {
        self.checksum_file.as_deref()
    }

    pub fn primary_part(&self) -> &str {
        &self.primary_part
    }

    /// Shared provenance handle for frames and results.
    pub fn provenance(&self) -> Arc<Provenance> {
        Arc::clone(&self.provenance)
    }

    pub(crate) fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("id", &self.id())
            .field("kind", &self.kind)
            .field("path", &self.path)
            .field("checksum", &self.checksum())
            .field("record_count", &self.record_count())
            .finish_non_exhaustive()
    }
}

/// Loads sources, verifying their checksum.
#[derive(Debug, Clone, Default)]
pub struct SourceLoader {
    catalog: Option<SourceCatalog>,
    options: LoadOptions,
}

impl SourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_catalog(mut self, catalog: SourceCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolve `locator` and verify its content against `expected_checksum`.
    pub fn load(&self, locator: &SourceLocator, expected_checksum: &str) -> Result<Source> {
        let expected = normalize_checksum(expected_checksum)?;
        let source = match locator {
            SourceLocator::Path(path) => self.load_path(path, &expected)?,
            SourceLocator::Named(id) => {
                let catalog = self
                    .catalog
                    .as_ref()
                    .ok_or_else(|| SourceError::SourceNotFound {
                        location: format!("catalog entry '{id}' (no catalog configured)"),
                    })?;
                let path = catalog.resolve(id)?;
                self.load_path(path, &expected)?
            }
            SourceLocator::InMemory { id, bytes } => load_in_memory(id, bytes, &expected)?,
        };

        info!(
            source_id = %source.id(),
            record_count = source.record_count(),
            checksum = %source.checksum(),
            "source loaded"
        );
        Ok(source)
    }

    fn load_path(&self, path: &Path, expected: &str) -> Result<Source> {
        if path.is_dir() {
            self.load_directory(path, expected)
        } else if path.is_file() {
            load_file(path, expected)
        } else {
            Err(SourceError::SourceNotFound {
                location: path.display().to_string(),
            })
        }
    }

    fn load_directory(&self, dir: &Path, expected: &str) -> Result<Source> {
        let metadata_path = dir.join(METADATA_FILE);
        if !metadata_path.is_file() {
            return Err(SourceError::SourceNotFound {
                location: metadata_path.display().to_string(),
            });
        }
        let metadata = SourceMetadata::load(&metadata_path)?;
        let id = metadata.id.clone().unwrap_or_else(|| file_name(dir));

        let checksum_file = dir.join(&metadata.checksum_file);
        let computed = compute_file_sha256(&checksum_file)?;
        let stated = metadata.checksum.trim().to_ascii_lowercase();
        if computed != expected || stated != computed {
            return Err(SourceError::ChecksumMismatch {
                source_id: id,
                expected: expected.to_string(),
                computed,
                stated: Some(stated),
            });
        }

        if self.options.verify_parts {
            let content = std::fs::read_to_string(&checksum_file)
                .map_err(|e| SourceError::io(&checksum_file, e))?;
            match parse_manifest(&content) {
                Some(entries) => verify_manifest(&id, dir, &entries)?,
                None => debug!(
                    source_id = %id,
                    checksum_file = %checksum_file.display(),
                    "checksum file is not a manifest, parts not verified"
                ),
            }
        }

        let record_count = match metadata.n {
            Some(n) => n,
            None => match find_part(dir, &metadata.primary_part) {
                Some(part) => count_rows(&part)?,
                None => {
                    warn!(
                        source_id = %id,
                        primary_part = %metadata.primary_part,
                        "no record count in metadata and no primary part, using 0"
                    );
                    0
                }
            },
        };

        let provenance = Provenance {
            source_id: id,
            checksum: computed,
            record_count,
            description: metadata.description,
        };
        Ok(Source::new(
            provenance,
            SourceKind::Directory,
            Some(dir.to_path_buf()),
            Some(checksum_file),
            metadata.primary_part,
        ))
    }
}

/// Load from a path with default options and no catalog.
pub fn load_source(path: impl AsRef<Path>, expected_checksum: &str) -> Result<Source> {
    SourceLoader::new().load(&SourceLocator::path(path.as_ref()), expected_checksum)
}

fn load_file(path: &Path, expected: &str) -> Result<Source> {
    let id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name(path));
    let computed = compute_file_sha256(path)?;
    if computed != expected {
        return Err(SourceError::ChecksumMismatch {
            source_id: id,
            expected: expected.to_string(),
            computed,
            stated: None,
        });
    }
    let record_count = count_rows(path)?;
    let provenance = Provenance {
        source_id: id.clone(),
        checksum: computed,
        record_count,
        description: None,
    };
    Ok(Source::new(
        provenance,
        SourceKind::File,
        Some(path.to_path_buf()),
        Some(path.to_path_buf()),
        id,
    ))
}

fn load_in_memory(id: &str, bytes: &[u8], expected: &str) -> Result<Source> {
    let computed = sha256_hex(bytes);
    if computed != expected {
        return Err(SourceError::ChecksumMismatch {
            source_id: id.to_string(),
            expected: expected.to_string(),
            computed,
            stated: None,
        });
    }
    let lines = bytes
        .split(|b| *b == b'\n')
        .filter(|line| !line.trim_ascii().is_empty())
        .count();
    let provenance = Provenance {
        source_id: id.to_string(),
        checksum: computed,
        record_count: lines.saturating_sub(1) as u64,
        description: None,
    };
    Ok(Source::new(provenance, SourceKind::InMemory, None, None, id.to_string())
        .with_bytes(bytes.to_vec()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
