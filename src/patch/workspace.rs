//! Throwaway directory used to run the patch tool against a manifest.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use tempfile::TempDir;

use crate::error::ChartError;
use crate::patch::WORKSPACE_PREFIX;

/// A uniquely named temporary directory owned by a single call.
///
/// The directory is removed by [`TempWorkspace::close`] or, failing that,
/// when the workspace is dropped. Removal errors are logged, never returned.
pub struct TempWorkspace {
    path: PathBuf,
    dir: Option<TempDir>,
}

impl TempWorkspace {
    /// Create a workspace under `root`, or the system temp dir if `None`.
    pub fn create(root: Option<&Path>) -> Result<TempWorkspace, ChartError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);

        let created = match root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        let dir = created.map_err(|e| ChartError::TempWorkspace {
            action: "create workspace in",
            path: root.map(Path::to_path_buf).unwrap_or_else(env::temp_dir),
            source: e,
        })?;

        Ok(TempWorkspace {
            path: dir.path().to_path_buf(),
            dir: Some(dir),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `data` to `name` inside the workspace and return its path.
    pub fn write(&self, name: &str, data: &[u8]) -> Result<PathBuf, ChartError> {
        let path = self.path.join(name);
        fs::write(&path, data).map_err(|e| ChartError::TempWorkspace {
            action: "write",
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }

    pub fn read(&self, name: &str) -> Result<Vec<u8>, ChartError> {
        let path = self.path.join(name);
        fs::read(&path).map_err(|e| ChartError::TempWorkspace {
            action: "read",
            path,
            source: e,
        })
    }

    /// Remove the workspace now.
    pub fn close(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = dir.close() {
                warn!("failed to remove workspace {}: {}", self.path.display(), e);
            }
        }
    }
}

impl Drop for TempWorkspace {
    fn drop(&mut self) {
        self.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_then_read_round_trips() {
        let workspace = TempWorkspace::create(None).unwrap();

        let path = workspace.write("Chart.yaml", b"name: c\n").unwrap();

        assert_eq!(path, workspace.path().join("Chart.yaml"));
        assert_eq!(workspace.read("Chart.yaml").unwrap(), b"name: c\n");
    }

    #[test]
    fn close_removes_directory() {
        let workspace = TempWorkspace::create(None).unwrap();
        workspace.write("Chart.yaml", b"name: c\n").unwrap();
        let path = workspace.path().to_path_buf();

        workspace.close();

        assert!(!path.exists());
    }

    #[test]
    fn drop_removes_directory() {
        let root = tempdir().unwrap();
        let path = {
            let workspace = TempWorkspace::create(Some(root.path())).unwrap();
            workspace.write("Chart.yaml", b"name: c\n").unwrap();
            workspace.path().to_path_buf()
        };

        assert!(!path.exists());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn uses_unique_prefixed_names() {
        let root = tempdir().unwrap();
        let a = TempWorkspace::create(Some(root.path())).unwrap();
        let b = TempWorkspace::create(Some(root.path())).unwrap();

        assert_ne!(a.path(), b.path());
        let name = a.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(WORKSPACE_PREFIX));
    }

    #[test]
    fn missing_root_is_workspace_error() {
        let result = TempWorkspace::create(Some(Path::new("/nonexistent/root")));

        assert!(matches!(result, Err(ChartError::TempWorkspace { .. })));
    }

    #[test]
    fn reading_missing_file_is_workspace_error() {
        let workspace = TempWorkspace::create(None).unwrap();

        let result = workspace.read("Chart.yaml");

        assert!(matches!(
            result,
            Err(ChartError::TempWorkspace { action: "read", .. })
        ));
    }
}
