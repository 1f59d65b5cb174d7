//! Locating the chart manifest inside a packaged chart archive.
//!
//! Charts are distributed as gzip-compressed tar streams. The scanner walks
//! the entries in archive order and returns the first regular file whose
//! base name is one of [`MANIFEST_FILENAMES`]. Nothing after that entry is
//! read.

use std::io::{self, Cursor, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use log::debug;
use tar::Archive;

use crate::error::ChartError;

/// Base names recognized as the chart manifest.
pub const MANIFEST_FILENAMES: [&str; 2] = ["Chart.yaml", "Chart.yml"];

/// Default upper bound on the manifest size (1 MiB).
pub const DEFAULT_MAX_MANIFEST_SIZE: u64 = 1024 * 1024;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Options for [`locate_manifest_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Largest manifest accepted, in bytes.
    pub max_manifest_size: u64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            max_manifest_size: DEFAULT_MAX_MANIFEST_SIZE,
        }
    }
}

/// The manifest entry found in an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFile {
    /// Matched base name, e.g. `Chart.yaml`
    pub file_name: String,
    /// Full path of the entry as stored in the archive
    pub entry_path: String,
    /// Raw, unmodified entry content
    pub data: Vec<u8>,
}

/// Returns true if `path`'s base name is a recognized manifest name.
pub fn is_manifest_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| MANIFEST_FILENAMES.contains(&name))
}

/// Locate the chart manifest using the default [`ScanOptions`].
pub fn locate_manifest<R: Read>(reader: R) -> Result<ManifestFile, ChartError> {
    locate_manifest_with(reader, &ScanOptions::default())
}

/// Decompress `reader` and return the first manifest entry in archive order.
pub fn locate_manifest_with<R: Read>(
    mut reader: R,
    options: &ScanOptions,
) -> Result<ManifestFile, ChartError> {
    // flate2 only reports a bad header on first read, which would surface
    // through tar as a traversal error. Check the magic up front instead.
    let mut magic = [0u8; 2];
    reader.read_exact(&mut magic).map_err(ChartError::Decompression)?;
    if magic != GZIP_MAGIC {
        return Err(ChartError::Decompression(io::Error::new(
            io::ErrorKind::InvalidData,
            "missing gzip header",
        )));
    }

    // Concatenated gzip members form one stream, as `gzip -c a b` produces
    let decoder = MultiGzDecoder::new(Cursor::new(magic).chain(reader));
    let mut archive = Archive::new(decoder);
    let entries = archive.entries().map_err(ChartError::ArchiveTraversal)?;

    for entry in entries {
        let mut entry = entry.map_err(ChartError::ArchiveTraversal)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry.path().map_err(ChartError::ArchiveTraversal)?;
        if !is_manifest_path(&path) {
            continue;
        }
        let entry_path = path.to_string_lossy().into_owned();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let limit = options.max_manifest_size;
        if entry.size() > limit {
            return Err(ChartError::ManifestTooLarge {
                entry: entry_path,
                limit,
            });
        }

        let mut data = Vec::with_capacity(entry.size() as usize);
        entry
            .by_ref()
            .take(limit + 1)
            .read_to_end(&mut data)
            .map_err(|e| ChartError::ManifestRead {
                entry: entry_path.clone(),
                source: e,
            })?;
        if data.len() as u64 > limit {
            return Err(ChartError::ManifestTooLarge {
                entry: entry_path,
                limit,
            });
        }

        debug!("found chart manifest {} ({} bytes)", entry_path, data.len());
        return Ok(ManifestFile {
            file_name,
            entry_path,
            data,
        });
    }

    Err(ChartError::ManifestNotFound)
}
