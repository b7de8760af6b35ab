//! Shape contracts and results.
//!
//! A [`ShapeResult`] binds a dataframe to one or more named shapes from a
//! [`ShapeRegistry`]. Every bound dataframe has been validated and coerced
//! against its contract, and the result carries the provenance of the source
//! the input was read from.
//!
//! - **registry**: built-in and declarative shape contracts
//! - **validate**: per-column coercion and contract checks
//! - **dispatch**: [`Dispatcher`], [`build_result`] and [`remap`]
//! - **result**: [`ShapeResult`] and its parts
//! - **export**: CSV and JSON manifest output
//! - **render**: the [`Renderer`] seam for plotting backends

pub mod dispatch;
pub mod error;
pub mod export;
pub mod registry;
pub mod render;
pub mod result;
pub mod validate;

pub use dispatch::{Dispatcher, build_result, remap};
pub use error::{Result, ShapeError, ShapeFailure, Violation};
pub use export::{ManifestShape, RESULT_MANIFEST, ResultManifest, export_result, write_csv};
pub use registry::{REGISTRY_VERSION, ShapeRegistry, builtin};
pub use render::{RenderRequest, Rendered, Renderer, render_all, render_requests};
pub use result::{RenderHints, ResultProvenance, ShapeBinding, ShapeResult, SkippedShape};
pub use validate::{coerce_column, validate_shape};
