//! Shape registry.
//!
//! ## Built-in shapes (version 1)
//!
//! | shape            | columns                                                   | extra            |
//! |------------------|-----------------------------------------------------------|------------------|
//! | `passthrough`    | none                                                      | keep, unchanged  |
//! | `proportion`     | `label` label, `proportion` proportion                    | drop             |
//! | `upset`          | `subject` label (optional)                                | indicator, >= 1  |
//! | `pyramid`        | `side`, `y`, `stack_group` label, `value` count           | drop             |
//! | `cumulative_bar` | `timepoint` numeric, `stack_group` label, `value` count   | drop             |
//!
//! Further shapes can be registered at runtime or declared in TOML:
//!
//! ```toml
//! [[shapes]]
//! name = "dose_response"
//! extra = "drop"
//!
//! [[shapes.columns]]
//! name = "dose"
//! type = "numeric"
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use serde::Deserialize;
use shape_model::{ColumnSpec, ExtraColumns, ModelError, SemanticType, ShapeSpec};

use crate::error::{Result, ShapeError};

/// Version of the built-in shape table.
pub const REGISTRY_VERSION: u32 = 1;

pub const PASSTHROUGH: &str = "passthrough";
pub const PROPORTION: &str = "proportion";
pub const UPSET: &str = "upset";
pub const PYRAMID: &str = "pyramid";
pub const CUMULATIVE_BAR: &str = "cumulative_bar";

static BUILTIN: LazyLock<Arc<ShapeRegistry>> = LazyLock::new(|| Arc::new(ShapeRegistry::builtin()));

/// Shared built-in registry.
pub fn builtin() -> Arc<ShapeRegistry> {
    Arc::clone(&BUILTIN)
}

/// Named shape contracts.
#[derive(Debug, Clone)]
pub struct ShapeRegistry {
    version: u32,
    shapes: BTreeMap<String, Arc<ShapeSpec>>,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    shapes: Vec<ShapeSpec>,
}

impl ShapeRegistry {
    /// Registry without any shapes.
    pub fn empty() -> Self {
        Self {
            version: REGISTRY_VERSION,
            shapes: BTreeMap::new(),
        }
    }

    /// Registry holding the built-in shapes.
    pub fn builtin() -> Self {
        let mut shapes = BTreeMap::new();
        for spec in builtin_shapes().into_iter().flatten() {
            shapes.insert(spec.name().to_string(), Arc::new(spec));
        }
        Self {
            version: REGISTRY_VERSION,
            shapes,
        }
    }

    /// Built-in shapes plus those declared in `content`.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: RegistryFile = toml::from_str(content).map_err(|e| ShapeError::Registry {
            message: e.to_string(),
        })?;
        let mut registry = Self::builtin();
        if let Some(version) = file.version {
            registry.version = version;
        }
        for spec in file.shapes {
            registry.register(spec)?;
        }
        Ok(registry)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ShapeError::Registry {
            message: format!("{}: {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Add a shape. Names are unique.
    pub fn register(&mut self, spec: ShapeSpec) -> Result<()> {
        if self.shapes.contains_key(spec.name()) {
            return Err(ShapeError::DuplicateShape {
                shape: spec.name().to_string(),
            });
        }
        self.shapes.insert(spec.name().to_string(), Arc::new(spec));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ShapeSpec> {
        self.shapes.get(name).map(Arc::as_ref)
    }

    pub fn require(&self, name: &str) -> Result<&ShapeSpec> {
        self.get(name).ok_or_else(|| ShapeError::UnknownShape {
            shape: name.to_string(),
        })
    }

    /// All contracts, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &ShapeSpec> {
        self.shapes.values().map(Arc::as_ref)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.shapes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn version(&self) -> u32 {
        self.version
    }
}

/// Built-in contracts. Every entry is valid; `builtin_table` checks that all
/// of them load.
fn builtin_shapes() -> Vec<std::result::Result<ShapeSpec, ModelError>> {
    use SemanticType::{Count, Indicator, Label, Numeric, Proportion};

    let shape = |name: &str, columns: Vec<ColumnSpec>, extra: ExtraColumns, description: &str| {
        ShapeSpec::new(name, columns, extra).map(|spec| spec.with_description(description))
    };

    vec![
        shape(
            PASSTHROUGH,
            vec![],
            ExtraColumns::Keep,
            "Any dataframe, carried unchanged",
        ),
        shape(
            PROPORTION,
            vec![
                ColumnSpec::required("label", Label),
                ColumnSpec::required("proportion", Proportion),
            ],
            ExtraColumns::Drop,
            "Proportion per category",
        ),
        shape(
            UPSET,
            vec![ColumnSpec::optional("subject", Label)],
            ExtraColumns::Typed(Indicator),
            "Set membership indicators, one column per set",
        )
        .map(|spec| spec.with_min_extra(1)),
        shape(
            PYRAMID,
            vec![
                ColumnSpec::required("side", Label),
                ColumnSpec::required("y", Label),
                ColumnSpec::required("stack_group", Label),
                ColumnSpec::required("value", Count),
            ],
            ExtraColumns::Drop,
            "Counts split left/right by side, stacked by group",
        ),
        shape(
            CUMULATIVE_BAR,
            vec![
                ColumnSpec::required("timepoint", Numeric),
                ColumnSpec::required("stack_group", Label),
                ColumnSpec::required("value", Count),
            ],
            ExtraColumns::Drop,
            "Counts per timepoint, stacked by group",
        ),
    ]
}
