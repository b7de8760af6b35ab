//! Checksum-verified source loading.
//!
//! A [`Source`] can only be obtained from [`SourceLoader::load`] (or
//! [`load_source`]), which recomputes the SHA-256 digest of the source's
//! canonical content and refuses to construct anything unless it matches the
//! checksum the caller expected. Frames read from a source through
//! [`read_part`] carry its [`Provenance`](shape_model::Provenance).

#![deny(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod hash;
pub mod loader;
pub mod manifest;
pub mod metadata;
pub mod parts;

pub use catalog::SourceCatalog;
pub use error::{Result, SourceError};
pub use hash::{compute_file_sha256, sha256_hex};
pub use loader::{LoadOptions, Source, SourceKind, SourceLoader, SourceLocator, load_source};
pub use metadata::{METADATA_FILE, SourceMetadata};
pub use parts::{list_parts, read_part};
