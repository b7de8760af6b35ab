//! Sectioned code-to-label tables.
//!
//! ## Invariants
//!
//! - Keys are unique per section (guaranteed by TOML tables).
//! - No label of a section equals a key of the same section. Translation
//!   relies on this: a translated value is never itself translatable, so
//!   translating twice gives the same result as translating once.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{TaxonomyError, TermError};

/// File extension of taxonomy files.
const TAXONOMY_EXTENSION: &str = "toml";

/// A translated term: a readable label or a boolean flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TermValue {
    Flag(bool),
    Label(String),
}

impl TermValue {
    pub fn as_label(&self) -> Option<&str> {
        match self {
            Self::Label(label) => Some(label),
            Self::Flag(_) => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(*flag),
            Self::Label(_) => None,
        }
    }
}

impl fmt::Display for TermValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(flag) => write!(f, "{flag}"),
            Self::Label(label) => f.write_str(label),
        }
    }
}

/// Symbolic name of a well-known taxonomy section.
///
/// Sections are matched to keys at load time by exact name, then by
/// normalized name (`presenceAbsence` matches `PRESENCE_ABSENCE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SectionKey(&'static str);

impl SectionKey {
    pub const GENDER: Self = Self("gender");
    pub const OUTCOME: Self = Self("outcome");
    pub const PRESENCE_ABSENCE: Self = Self("presence_absence");
    pub const CONDITION: Self = Self("condition");

    /// Keys resolved for every loaded taxonomy.
    pub const WELL_KNOWN: [Self; 4] = [
        Self::GENDER,
        Self::OUTCOME,
        Self::PRESENCE_ABSENCE,
        Self::CONDITION,
    ];

    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Read-only view of one section.
#[derive(Debug, Clone, Copy)]
pub struct Namespace<'a> {
    name: &'a str,
    terms: &'a BTreeMap<String, TermValue>,
}

impl<'a> Namespace<'a> {
    /// Actual section name in the taxonomy file.
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn get(&self, code: &str) -> Option<&'a TermValue> {
        self.terms.get(code)
    }

    /// Label for `code`, if the entry is a label.
    pub fn label(&self, code: &str) -> Option<&'a str> {
        self.get(code).and_then(TermValue::as_label)
    }

    /// First code (in key order) translating to `label`.
    pub fn code_for(&self, label: &str) -> Option<&'a str> {
        self.terms
            .iter()
            .find(|(_, value)| value.as_label() == Some(label))
            .map(|(code, _)| code.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a TermValue)> {
        self.terms.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// An immutable, validated taxonomy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxonomyTable {
    name: String,
    sections: BTreeMap<String, BTreeMap<String, TermValue>>,
    /// Well-known keys resolved to actual section names at load time.
    namespaces: BTreeMap<SectionKey, String>,
}

impl TaxonomyTable {
    /// Build from sections, enforcing the label/key invariant.
    pub fn from_sections(
        name: impl Into<String>,
        sections: BTreeMap<String, BTreeMap<String, TermValue>>,
    ) -> Result<Self, TaxonomyError> {
        for (section, terms) in &sections {
            for value in terms.values() {
                if let TermValue::Label(label) = value
                    && terms.contains_key(label)
                {
                    return Err(TaxonomyError::LabelIsKey {
                        section: section.clone(),
                        label: label.clone(),
                    });
                }
            }
        }

        let namespaces = SectionKey::WELL_KNOWN
            .iter()
            .filter_map(|key| {
                resolve_name(sections.keys().map(String::as_str), key.as_str())
                    .ok()
                    .map(|section| (*key, section.to_string()))
            })
            .collect();

        Ok(Self {
            name: name.into(),
            sections,
            namespaces,
        })
    }

    /// Parse taxonomy TOML.
    pub fn from_toml_str(name: impl Into<String>, content: &str) -> Result<Self, TaxonomyError> {
        let name = name.into();
        let document: toml::Table = toml::from_str(content).map_err(|e| TaxonomyError::Toml {
            name: name.clone(),
            message: e.to_string(),
        })?;

        let mut sections = BTreeMap::new();
        for (section, value) in document {
            let toml::Value::Table(entries) = value else {
                return Err(TaxonomyError::Format {
                    name,
                    message: format!("top-level entry '{section}' is not a section table"),
                });
            };
            let mut terms = BTreeMap::new();
            for (key, value) in entries {
                let term = match value {
                    toml::Value::String(label) => TermValue::Label(label),
                    toml::Value::Boolean(flag) => TermValue::Flag(flag),
                    other => {
                        return Err(TaxonomyError::Format {
                            name,
                            message: format!(
                                "[{section}] '{key}' must be a string or boolean, found {}",
                                other.type_str()
                            ),
                        });
                    }
                };
                terms.insert(key, term);
            }
            sections.insert(section, terms);
        }

        let table = Self::from_sections(name, sections)?;
        debug!(
            taxonomy = %table.name,
            sections = table.sections.len(),
            "loaded taxonomy"
        );
        Ok(table)
    }

    /// Taxonomy name (file stem for loaded files).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&TermValue> {
        self.sections.get(section).and_then(|terms| terms.get(key))
    }

    pub fn section(&self, name: &str) -> Option<Namespace<'_>> {
        self.sections
            .get_key_value(name)
            .map(|(name, terms)| Namespace { name, terms })
    }

    /// First code in `section` translating to `label`.
    pub fn code_for(&self, section: &str, label: &str) -> Option<&str> {
        self.section(section)?.code_for(label)
    }

    /// Section registered for a well-known key.
    pub fn namespace(&self, key: SectionKey) -> Option<Namespace<'_>> {
        self.namespaces
            .get(&key)
            .and_then(|section| self.section(section))
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> + Clone {
        self.sections.keys().map(String::as_str)
    }

    /// Section used to translate `column`.
    ///
    /// An explicit section must exist. Otherwise an exact section name wins,
    /// then the single section whose normalized name matches.
    pub fn resolve_section(&self, column: &str, explicit: Option<&str>) -> Result<&str, TermError> {
        if let Some(section) = explicit {
            return self
                .sections
                .get_key_value(section)
                .map(|(name, _)| name.as_str())
                .ok_or_else(|| TermError::SectionResolution {
                    column: column.to_string(),
                    candidates: Vec::new(),
                });
        }
        resolve_name(self.section_names(), column).map_err(|candidates| {
            TermError::SectionResolution {
                column: column.to_string(),
                candidates,
            }
        })
    }
}

/// Lower-case with `_` and `-` removed.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Exact match, else the unique normalized match. On failure returns the
/// normalized candidates (empty when nothing matched).
fn resolve_name<'a>(
    names: impl Iterator<Item = &'a str> + Clone,
    wanted: &str,
) -> Result<&'a str, Vec<String>> {
    if let Some(exact) = names.clone().find(|name| *name == wanted) {
        return Ok(exact);
    }
    let target = normalize(wanted);
    let candidates: Vec<&str> = names.filter(|name| normalize(name) == target).collect();
    match candidates.as_slice() {
        [single] => Ok(single),
        _ => Err(candidates.iter().map(ToString::to_string).collect()),
    }
}

/// Load a taxonomy file.
pub fn load_taxonomy(path: &Path) -> Result<TaxonomyTable, TaxonomyError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            TaxonomyError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            TaxonomyError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    TaxonomyTable::from_toml_str(name, &content)
}

/// Load `<dir>/<name>.toml`; `name` may already end in `.toml`.
pub fn load_named_taxonomy(dir: &Path, name: &str) -> Result<TaxonomyTable, TaxonomyError> {
    let stem = name
        .strip_suffix(&format!(".{TAXONOMY_EXTENSION}"))
        .unwrap_or(name);
    let path: PathBuf = dir.join(format!("{stem}.{TAXONOMY_EXTENSION}"));
    load_taxonomy(&path)
}

/// Distinct labels of a section, for recognizing already translated cells.
pub(crate) fn labels(namespace: &Namespace<'_>) -> BTreeSet<String> {
    namespace
        .iter()
        .filter_map(|(_, value)| value.as_label().map(str::to_string))
        .collect()
}
