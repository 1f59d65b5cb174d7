use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use crate::metadata::Metadata;

/// Errors produced while locating, patching, or parsing chart metadata.
#[derive(Debug)]
pub enum ChartError {
    /// Input is not a valid gzip stream
    Decompression(io::Error),
    /// Corrupt or truncated tar archive
    ArchiveTraversal(io::Error),
    /// Archive scanned fully without a Chart.yaml / Chart.yml entry
    ManifestNotFound,
    /// I/O failure while reading the matched entry
    ManifestRead { entry: String, source: io::Error },
    /// Matched entry is larger than the configured limit
    ManifestTooLarge { entry: String, limit: u64 },
    /// Manifest bytes could not be decoded; `partial` holds the fields that did
    Deserialize { partial: Box<Metadata>, reason: String },
    /// The patch executable could not be found on the search path
    PatchToolUnavailable { program: String },
    /// Patch file missing or unreadable
    PatchFileOpen { path: PathBuf, source: io::Error },
    /// The patch tool failed to run or exited non-zero
    PatchApplication(PatchFailure),
    /// Temporary workspace create/write/read failure
    TempWorkspace { action: &'static str, path: PathBuf, source: io::Error },
    /// Any other I/O failure (reading chart files, writing reports)
    Io { path: PathBuf, source: io::Error },
}

/// Why the external patch tool did not succeed.
#[derive(Debug)]
pub enum PatchFailure {
    Spawn(io::Error),
    Exit(ExitStatus),
}

impl fmt::Display for PatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchFailure::Spawn(e) => write!(f, "failed to run patch: {}", e),
            PatchFailure::Exit(status) => match status.code() {
                Some(code) => write!(f, "exit status {}", code),
                None => write!(f, "terminated by signal"),
            },
        }
    }
}

impl ChartError {
    /// The partially decoded record carried by a deserialization failure.
    pub fn partial_metadata(&self) -> Option<&Metadata> {
        match self {
            ChartError::Deserialize { partial, .. } => Some(&**partial),
            _ => None,
        }
    }
}

impl fmt::Display for ChartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartError::Decompression(e) => write!(f, "not a valid gzip stream: {}", e),
            ChartError::ArchiveTraversal(e) => write!(f, "failed to read chart archive: {}", e),
            ChartError::ManifestNotFound => write!(f, "Chart.yaml not found in chart archive"),
            ChartError::ManifestRead { entry, source } => {
                write!(f, "failed to read '{}': {}", entry, source)
            }
            ChartError::ManifestTooLarge { entry, limit } => {
                write!(f, "'{}' exceeds the {} byte manifest limit", entry, limit)
            }
            ChartError::Deserialize { reason, .. } => {
                write!(f, "can not load Chart.yaml: {}", reason)
            }
            ChartError::PatchToolUnavailable { program } => {
                write!(f, "cannot apply patch file: '{}' is not available", program)
            }
            ChartError::PatchFileOpen { path, source } => {
                write!(f, "failed to open {}: {}", path.display(), source)
            }
            ChartError::PatchApplication(failure) => {
                write!(f, "unable to apply patch: {}", failure)
            }
            ChartError::TempWorkspace {
                action,
                path,
                source,
            } => write!(f, "failed to {} {}: {}", action, path.display(), source),
            ChartError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
        }
    }
}

impl std::error::Error for ChartError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChartError::Decompression(e) | ChartError::ArchiveTraversal(e) => Some(e),
            ChartError::ManifestRead { source, .. }
            | ChartError::PatchFileOpen { source, .. }
            | ChartError::TempWorkspace { source, .. }
            | ChartError::Io { source, .. } => Some(source),
            ChartError::PatchApplication(PatchFailure::Spawn(e)) => Some(e),
            _ => None,
        }
    }
}
