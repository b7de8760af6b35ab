//! Taxonomy tables and term translation.
//!
//! A taxonomy is a TOML file of sections, each mapping coded terms to a
//! readable label or a boolean flag:
//!
//! ```toml
//! [gender]
//! "http://snomed.info/sct|248153007" = "male"
//! "http://snomed.info/sct|248152002" = "female"
//!
//! [presence_absence]
//! "http://snomed.info/sct|373066001" = true
//! "http://snomed.info/sct|373067005" = false
//! ```
//!
//! [`translate`] replaces coded cells with their labels, one column at a
//! time, resolving each column to a section by name.

pub mod error;
pub mod taxonomy;
pub mod translate;

pub use error::{TaxonomyError, TermError};
pub use taxonomy::{
    Namespace, SectionKey, TaxonomyTable, TermValue, load_named_taxonomy, load_taxonomy,
};
pub use translate::{TermColumn, Translator, translate, translate_sourced};
