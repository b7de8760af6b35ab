pub mod error;
pub mod frame;
pub mod options;
pub mod provenance;
pub mod shape;

pub use error::{ModelError, Result};
pub use frame::SourcedFrame;
pub use options::{DispatchOptions, OnShapeError, TranslateOptions, UnmappedPolicy};
pub use provenance::{DerivationStep, Provenance};
pub use shape::{ColumnSpec, ExtraColumns, SemanticType, ShapeSpec};
