//! Extract Helm chart metadata from packaged chart archives, optionally
//! applying a unified-diff patch to the manifest first.

pub mod archive;
pub mod commands;
pub mod error;
pub mod loader;
pub mod metadata;
pub mod patch;
pub mod utils;


pub use archive::{locate_manifest, ManifestFile, ScanOptions, MANIFEST_FILENAMES};
pub use error::ChartError;
pub use loader::{load_metadata_tgz, MetadataLoader, PatchStrategy};
pub use metadata::Metadata;
