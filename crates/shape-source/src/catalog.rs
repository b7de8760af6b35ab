//! Named sources.
//!
//! A catalog maps source identifiers to locations so callers can load by
//! name instead of path:
//!
//! ```toml
//! [sources]
//! isaric-demo = "data/isaric-demo"
//! survey = "/srv/exports/survey.csv"
//! ```
//!
//! Relative paths are resolved against the catalog file's directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, SourceError};

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    sources: BTreeMap<String, PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    sources: BTreeMap<String, PathBuf>,
}

impl SourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse catalog TOML, resolving relative paths against `base_dir`.
    pub fn from_toml_str(content: &str, base_dir: &Path) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content).map_err(|e| SourceError::Catalog {
            path: base_dir.to_path_buf(),
            message: e.to_string(),
        })?;
        let sources = file
            .sources
            .into_iter()
            .map(|(id, path)| {
                let path = if path.is_absolute() {
                    path
                } else {
                    base_dir.join(path)
                };
                (id, path)
            })
            .collect();
        Ok(Self { sources })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SourceError::io(path, e))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_toml_str(&content, base_dir).map_err(|e| match e {
            SourceError::Catalog { message, .. } => SourceError::Catalog {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    #[must_use]
    pub fn with_source(mut self, id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.sources.insert(id.into(), path.into());
        self
    }

    /// Location registered for `id`.
    pub fn resolve(&self, id: &str) -> Result<&Path> {
        self.sources
            .get(id)
            .map(PathBuf::as_path)
            .ok_or_else(|| SourceError::SourceNotFound {
                location: format!("catalog entry '{id}'"),
            })
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_resolve_against_base() {
        let catalog = SourceCatalog::from_toml_str(
            "[sources]\ndemo = \"data/demo\"\nabs = \"/srv/abs.csv\"\n",
            Path::new("/etc/shapes"),
        )
        .unwrap();
        assert_eq!(catalog.resolve("demo").unwrap(), Path::new("/etc/shapes/data/demo"));
        assert_eq!(catalog.resolve("abs").unwrap(), Path::new("/srv/abs.csv"));
        assert_eq!(catalog.ids().collect::<Vec<_>>(), vec!["abs", "demo"]);
    }

    #[test]
    fn unknown_name_is_not_found() {
        let err = SourceCatalog::new().resolve("nope").unwrap_err();
        assert_eq!(err.to_string(), "source not found: catalog entry 'nope'");
    }
}
