//! Building results from frames.

use std::sync::Arc;

use polars::prelude::DataFrame;
use shape_common::logging::redact_value;
use shape_map::{ColumnAliases, map_sourced};
use shape_model::{DerivationStep, DispatchOptions, OnShapeError, SourcedFrame};
use tracing::{info, warn};

use crate::error::{Result, ShapeError, ShapeFailure};
use crate::registry::{ShapeRegistry, builtin};
use crate::result::{ShapeBinding, ShapeResult, SkippedShape};
use crate::validate::validate_shape;

/// Validates frames against registered shapes.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ShapeRegistry>,
    options: DispatchOptions,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(builtin())
    }
}

impl Dispatcher {
    pub fn new(registry: Arc<ShapeRegistry>) -> Self {
        Self {
            registry,
            options: DispatchOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: DispatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &ShapeRegistry {
        &self.registry
    }

    /// Validate `frame` against each of `shapes` independently.
    ///
    /// Each shape sees the same input. Provenance comes from the frame's
    /// attached source.
    pub fn build(
        &self,
        frame: &SourcedFrame,
        shapes: &[&str],
        aliases: Option<&ColumnAliases>,
    ) -> Result<ShapeResult> {
        if shapes.is_empty() {
            return Err(ShapeError::NoShapesRequested);
        }

        let mut bindings: Vec<ShapeBinding> = Vec::with_capacity(shapes.len());
        let mut skipped = Vec::new();
        let mut failures = Vec::new();
        let mut lineage = frame.lineage().to_vec();

        for &shape in shapes {
            if bindings.iter().any(|b| b.shape == shape) {
                continue;
            }
            let outcome = self
                .registry
                .require(shape)
                .and_then(|spec| validate_shape(&frame.data, spec, aliases));
            match outcome {
                Ok(data) => {
                    lineage.push(DerivationStep::new("validate").with_detail(shape));
                    bindings.push(ShapeBinding {
                        shape: shape.to_string(),
                        data,
                    });
                }
                Err(error) => match self.options.on_shape_error {
                    OnShapeError::Abort => return Err(error),
                    OnShapeError::SkipShape => {
                        let value = error.cell_value();
                        warn!(
                            shape,
                            column = error.column().unwrap_or("-"),
                            kind = error.kind(),
                            value = value.as_deref().map(redact_value),
                            "skipping shape"
                        );
                        skipped.push(SkippedShape {
                            shape: shape.to_string(),
                            reason: error.to_string(),
                        });
                        failures.push(ShapeFailure {
                            shape: shape.to_string(),
                            error,
                        });
                    }
                },
            }
        }

        if bindings.is_empty() {
            return Err(ShapeError::NoValidShapes { failures });
        }

        let result = ShapeResult::new(
            bindings,
            frame.clone(),
            lineage,
            skipped,
            self.registry.version(),
        );
        info!(
            shapes = ?result.shape_names(),
            skipped = result.skipped().len(),
            source_id = result.provenance().source_id.as_deref().unwrap_or("-"),
            "built result"
        );
        Ok(result)
    }

    /// Re-validate a result's original input against another shape.
    ///
    /// `aliases` rename origin columns onto the target's column names. The
    /// given result is left as it is.
    pub fn remap(
        &self,
        result: &ShapeResult,
        target_shape: &str,
        aliases: &ColumnAliases,
    ) -> Result<ShapeResult> {
        let spec = self.registry.require(target_shape)?;
        let origin = result.origin_frame();
        let mapped = if aliases.is_empty() {
            origin.clone()
        } else {
            map_sourced(origin, &aliases.to_mapping())?
        };
        let data = validate_shape(&mapped.data, spec, None)?;

        let mut lineage = result.lineage().to_vec();
        lineage.extend(mapped.lineage().iter().skip(origin.lineage().len()).cloned());
        lineage.push(DerivationStep::new("validate").with_detail(target_shape));

        let remapped = ShapeResult::new(
            vec![ShapeBinding {
                shape: target_shape.to_string(),
                data,
            }],
            origin.clone(),
            lineage,
            Vec::new(),
            self.registry.version(),
        );
        let mut remapped = remapped.with_hints(result.hints().clone());
        if let Some(payload) = result.payload() {
            remapped = remapped.with_payload(payload.clone());
        }
        info!(from = ?result.shape_names(), to = target_shape, "remapped result");
        Ok(remapped)
    }
}

/// Build a result for a plain dataframe with the built-in registry.
pub fn build_result(
    df: &DataFrame,
    shapes: &[&str],
    aliases: Option<&ColumnAliases>,
) -> Result<ShapeResult> {
    Dispatcher::default().build(&SourcedFrame::new(df.clone()), shapes, aliases)
}

/// [`Dispatcher::remap`] with the built-in registry.
pub fn remap(result: &ShapeResult, target_shape: &str, aliases: &ColumnAliases) -> Result<ShapeResult> {
    Dispatcher::default().remap(result, target_shape, aliases)
}
