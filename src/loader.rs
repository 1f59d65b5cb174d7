//! Loading chart metadata from a packaged chart, optionally patched.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use log::info;

use crate::archive::{locate_manifest_with, ManifestFile, ScanOptions};
use crate::error::ChartError;
use crate::metadata::Metadata;
use crate::patch::{scan_name_directive, PatchTool, TempWorkspace};

/// How a patch file is applied to the chart manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PatchStrategy {
    /// Parse the manifest, then take the chart name from `+name:` lines in
    /// the patch. Only the name can change; no external tool is needed.
    DirectiveScan,
    /// Apply the patch to the raw manifest in a temporary directory with
    /// the patch tool, then parse the result. Any field can change.
    #[default]
    FilesystemRoundTrip,
}

/// Extracts [`Metadata`] from gzip-compressed chart archives.
#[derive(Debug, Clone, Default)]
pub struct MetadataLoader {
    strategy: PatchStrategy,
    patch_tool: PatchTool,
    scan_options: ScanOptions,
    temp_root: Option<PathBuf>,
}

impl MetadataLoader {
    pub fn new(strategy: PatchStrategy) -> Self {
        MetadataLoader {
            strategy,
            ..MetadataLoader::default()
        }
    }

    pub fn with_patch_tool(mut self, patch_tool: PatchTool) -> Self {
        self.patch_tool = patch_tool;
        self
    }

    pub fn with_scan_options(mut self, scan_options: ScanOptions) -> Self {
        self.scan_options = scan_options;
        self
    }

    /// Create patch workspaces under `root` instead of the system temp dir.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    pub fn strategy(&self) -> PatchStrategy {
        self.strategy
    }

    /// Locate the manifest in `tgz`, apply `patch_file` if given, and parse it.
    ///
    /// A manifest that fails to parse yields [`ChartError::Deserialize`]
    /// carrying the partially decoded record.
    pub fn load<R: Read>(
        &self,
        tgz: R,
        patch_file: Option<&Path>,
    ) -> Result<Metadata, ChartError> {
        let manifest = locate_manifest_with(tgz, &self.scan_options)?;
        match (self.strategy, patch_file) {
            (_, None) => Metadata::from_yaml(&manifest.data),
            (PatchStrategy::DirectiveScan, Some(patch_file)) => {
                self.load_with_directives(&manifest, patch_file)
            }
            (PatchStrategy::FilesystemRoundTrip, Some(patch_file)) => {
                self.load_with_round_trip(&manifest, patch_file)
            }
        }
    }

    fn load_with_directives(
        &self,
        manifest: &ManifestFile,
        patch_file: &Path,
    ) -> Result<Metadata, ChartError> {
        let mut metadata = Metadata::from_yaml(&manifest.data)?;

        let open_error = |e| ChartError::PatchFileOpen {
            path: patch_file.to_path_buf(),
            source: e,
        };
        let file = File::open(patch_file).map_err(open_error)?;
        if let Some(name) = scan_name_directive(BufReader::new(file)).map_err(open_error)? {
            info!(
                "update chart name [{}] from patch {}",
                name,
                patch_file.display()
            );
            metadata.name = name;
        }

        Ok(metadata)
    }

    fn load_with_round_trip(
        &self,
        manifest: &ManifestFile,
        patch_file: &Path,
    ) -> Result<Metadata, ChartError> {
        // Fail on a missing tool before anything is written
        self.patch_tool.resolve()?;

        let workspace = TempWorkspace::create(self.temp_root.as_deref())?;
        workspace.write(&manifest.file_name, &manifest.data)?;
        self.patch_tool.apply(patch_file, workspace.path())?;
        let patched = workspace.read(&manifest.file_name)?;
        workspace.close();

        Metadata::from_yaml(&patched)
    }
}

/// Load metadata with the default loader ([`PatchStrategy::FilesystemRoundTrip`]).
pub fn load_metadata_tgz<R: Read>(
    tgz: R,
    patch_file: Option<&Path>,
) -> Result<Metadata, ChartError> {
    MetadataLoader::default().load(tgz, patch_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::simple_chart;
    use std::fs;
    use tempfile::tempdir;

    const MANIFEST: &str = "name: original\nversion: 1.0.0\n";

    fn write_patch(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("Chart.yaml.patch");
        fs::write(&path, content).unwrap();
        path
    }

    fn unavailable_tool(dir: &Path) -> PatchTool {
        PatchTool::default().with_search_path(dir.as_os_str())
    }

    #[test]
    fn defaults_to_round_trip() {
        assert_eq!(
            MetadataLoader::default().strategy(),
            PatchStrategy::FilesystemRoundTrip
        );
    }

    #[test]
    fn no_patch_parses_directly_with_either_strategy() {
        let data = simple_chart(MANIFEST);

        for strategy in [PatchStrategy::DirectiveScan, PatchStrategy::FilesystemRoundTrip] {
            let metadata = MetadataLoader::new(strategy).load(&data[..], None).unwrap();
            assert_eq!(metadata.name, "original");
            assert_eq!(metadata.version, "1.0.0");
        }
    }

    #[test]
    fn no_patch_is_idempotent() {
        let data = simple_chart(MANIFEST);

        let first = load_metadata_tgz(&data[..], None).unwrap();
        let second = load_metadata_tgz(&data[..], None).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn directive_scan_last_name_wins() {
        let dir = tempdir().unwrap();
        let patch = write_patch(dir.path(), "+name: foo\n+name: bar\n");
        let data = simple_chart(MANIFEST);

        let metadata = MetadataLoader::new(PatchStrategy::DirectiveScan)
            .load(&data[..], Some(&patch))
            .unwrap();

        assert_eq!(metadata.name, "bar");
        assert_eq!(metadata.version, "1.0.0");
    }

    #[test]
    fn directive_scan_without_directive_keeps_name() {
        let dir = tempdir().unwrap();
        let patch = write_patch(dir.path(), "-version: 1.0.0\n+version: 2.0.0\n");
        let data = simple_chart(MANIFEST);

        let metadata = MetadataLoader::new(PatchStrategy::DirectiveScan)
            .load(&data[..], Some(&patch))
            .unwrap();

        // Only the name is ever rewritten by this strategy
        assert_eq!(metadata.name, "original");
        assert_eq!(metadata.version, "1.0.0");
    }

    #[test]
    fn directive_scan_does_not_need_patch_tool() {
        let dir = tempdir().unwrap();
        let patch = write_patch(dir.path(), "+name: renamed\n");
        let data = simple_chart(MANIFEST);

        let metadata = MetadataLoader::new(PatchStrategy::DirectiveScan)
            .with_patch_tool(unavailable_tool(dir.path()))
            .load(&data[..], Some(&patch))
            .unwrap();

        assert_eq!(metadata.name, "renamed");
    }

    #[test]
    fn directive_scan_tolerates_non_utf8_patch() {
        let dir = tempdir().unwrap();
        let patch = dir.path().join("Chart.yaml.patch");
        let mut content = b"--- a/README.md\n+++ b/README.md\n+caf".to_vec();
        content.push(0xe9);
        content.extend_from_slice(b"\n--- a/Chart.yaml\n+++ b/Chart.yaml\n+name: renamed\n");
        fs::write(&patch, content).unwrap();
        let data = simple_chart(MANIFEST);

        let metadata = MetadataLoader::new(PatchStrategy::DirectiveScan)
            .load(&data[..], Some(&patch))
            .unwrap();

        assert_eq!(metadata.name, "renamed");
    }

    #[test]
    fn directive_scan_missing_patch_file() {
        let data = simple_chart(MANIFEST);

        let result = MetadataLoader::new(PatchStrategy::DirectiveScan)
            .load(&data[..], Some(Path::new("/nonexistent/Chart.yaml.patch")));

        assert!(matches!(result, Err(ChartError::PatchFileOpen { .. })));
    }

    #[test]
    fn directive_scan_parse_failure_skips_patch() {
        // The patch file does not exist, so reaching it would be a different error
        let data = simple_chart("name: broken\nkeywords: nope\n");

        let err = MetadataLoader::new(PatchStrategy::DirectiveScan)
            .load(&data[..], Some(Path::new("/nonexistent/Chart.yaml.patch")))
            .unwrap_err();

        assert_eq!(err.partial_metadata().unwrap().name, "broken");
    }

    #[test]
    fn round_trip_unavailable_tool_touches_nothing() {
        let bin = tempdir().unwrap();
        let temp_root = tempdir().unwrap();
        let patch = write_patch(bin.path(), "+name: renamed\n");
        let data = simple_chart(MANIFEST);

        let result = MetadataLoader::new(PatchStrategy::FilesystemRoundTrip)
            .with_patch_tool(unavailable_tool(bin.path()))
            .with_temp_root(temp_root.path())
            .load(&data[..], Some(&patch));

        assert!(matches!(result, Err(ChartError::PatchToolUnavailable { .. })));
        assert_eq!(fs::read_dir(temp_root.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn round_trip_failure_removes_workspace() {
        use std::os::unix::fs::PermissionsExt;

        let bin = tempdir().unwrap();
        let temp_root = tempdir().unwrap();
        let tool_path = bin.path().join("patch");
        fs::write(&tool_path, "#!/bin/sh\necho rejected\nexit 1\n").unwrap();
        fs::set_permissions(&tool_path, fs::Permissions::from_mode(0o755)).unwrap();
        let patch = write_patch(bin.path(), "garbage\n");
        let data = simple_chart(MANIFEST);

        let result = MetadataLoader::default()
            .with_patch_tool(PatchTool::new(&tool_path))
            .with_temp_root(temp_root.path())
            .load(&data[..], Some(&patch));

        assert!(matches!(result, Err(ChartError::PatchApplication(_))));
        assert_eq!(fs::read_dir(temp_root.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn round_trip_rereads_patched_manifest() {
        use std::os::unix::fs::PermissionsExt;

        // Stand-in tool that rewrites the manifest in its working directory
        let bin = tempdir().unwrap();
        let temp_root = tempdir().unwrap();
        let tool_path = bin.path().join("patch");
        fs::write(
            &tool_path,
            "#!/bin/sh\nprintf 'name: rewritten\\nversion: 3.0.0\\n' > Chart.yaml\n",
        )
        .unwrap();
        fs::set_permissions(&tool_path, fs::Permissions::from_mode(0o755)).unwrap();
        let patch = write_patch(bin.path(), "");
        let data = simple_chart(MANIFEST);

        let metadata = MetadataLoader::default()
            .with_patch_tool(PatchTool::new(&tool_path))
            .with_temp_root(temp_root.path())
            .load(&data[..], Some(&patch))
            .unwrap();

        assert_eq!(metadata.name, "rewritten");
        assert_eq!(metadata.version, "3.0.0");
        assert_eq!(fs::read_dir(temp_root.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn round_trip_with_relative_tool_path() {
        use std::os::unix::fs::PermissionsExt;

        let bin = tempfile::Builder::new().tempdir_in(".").unwrap();
        let temp_root = tempdir().unwrap();
        fs::write(
            bin.path().join("patch"),
            "#!/bin/sh\nprintf 'name: relative\\nversion: 1.0.0\\n' > Chart.yaml\n",
        )
        .unwrap();
        fs::set_permissions(bin.path().join("patch"), fs::Permissions::from_mode(0o755)).unwrap();
        let relative = Path::new(".")
            .join(bin.path().file_name().unwrap())
            .join("patch");
        let patch = write_patch(temp_root.path(), "");
        let data = simple_chart(MANIFEST);

        let metadata = MetadataLoader::default()
            .with_patch_tool(PatchTool::new(&relative))
            .load(&data[..], Some(&patch))
            .unwrap();

        assert_eq!(metadata.name, "relative");
    }

    #[test]
    fn missing_manifest_fails_with_either_strategy() {
        let data = crate::test::chart_tgz(&[crate::test::TestEntry::File(
            "c/values.yaml",
            b"a: 1\n",
        )]);

        for strategy in [PatchStrategy::DirectiveScan, PatchStrategy::FilesystemRoundTrip] {
            let result = MetadataLoader::new(strategy).load(&data[..], None);
            assert!(matches!(result, Err(ChartError::ManifestNotFound)));
        }
    }
}
