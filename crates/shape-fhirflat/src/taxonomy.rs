//! Bundled FHIRflat terminology.

use shape_terms::{TaxonomyError, TaxonomyTable};

/// Name of the bundled taxonomy.
pub const DEFAULT_TAXONOMY_NAME: &str = "fhirflat";

const DEFAULT_TAXONOMY: &str = include_str!("../data/fhirflat.toml");

/// The bundled taxonomy with `gender`, `outcome`, `presence_absence` and
/// `condition` sections.
pub fn default_taxonomy() -> Result<TaxonomyTable, TaxonomyError> {
    TaxonomyTable::from_toml_str(DEFAULT_TAXONOMY_NAME, DEFAULT_TAXONOMY)
}
