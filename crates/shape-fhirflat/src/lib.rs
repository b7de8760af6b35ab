//! FHIRflat analyses.
//!
//! A FHIRflat source holds one part per FHIR resource (`patient`,
//! `encounter`, `condition`, ...) with nested fields flattened into dotted
//! column names such as `extension.age.value`. The functions here read those
//! parts from a checksum-verified [`Source`](shape_source::Source), translate
//! coded values through a taxonomy and return a
//! [`ShapeResult`](shape_result::ShapeResult) that carries the source's
//! provenance.
//!
//! ```no_run
//! use shape_fhirflat::{condition_proportion, default_taxonomy};
//! use shape_source::load_source;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = load_source("data/cohort", "03cc8e28d97a6a3ab20926d7c3f891f14e119eb882c6e8d3deb07e1b79eed089")?;
//! let result = condition_proportion(&source, &default_taxonomy()?)?;
//! println!("{:?}", result.data("proportion"));
//! # Ok(())
//! # }
//! ```

pub mod condition;
pub mod error;
pub mod pyramid;
pub mod taxonomy;

pub use condition::{DEFAULT_UPSET_CONDITIONS, condition_proportion, condition_upset, read_condition};
pub use error::{FhirflatError, Result};
pub use pyramid::{AGE_UNIT_YEARS, AgeBins, age_pyramid, age_pyramid_with_bins};
pub use taxonomy::{DEFAULT_TAXONOMY_NAME, default_taxonomy};

pub const PATIENT_PART: &str = "patient";
pub const ENCOUNTER_PART: &str = "encounter";
pub const CONDITION_PART: &str = "condition";

/// Prefix of FHIR references to patients, e.g. `Patient/p1`.
pub const PATIENT_REFERENCE_PREFIX: &str = "Patient/";
