use std::fs;
use std::path::Path;

use crate::archive::{locate_manifest_with, ManifestFile, ScanOptions};
use crate::commands::open_chart;
use crate::error::ChartError;

/// Pull the raw manifest out of `chart`, writing it to `output` if given.
pub fn run(
    chart: &Path,
    output: Option<&Path>,
    options: &ScanOptions,
) -> Result<ManifestFile, ChartError> {
    let manifest = locate_manifest_with(open_chart(chart)?, options)?;

    if let Some(output) = output {
        fs::write(output, &manifest.data).map_err(|e| ChartError::Io {
            path: output.to_path_buf(),
            source: e,
        })?;
    }

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::simple_chart;
    use tempfile::tempdir;

    const MANIFEST: &str = "name: mychart\nversion: 1.0.0\n";

    #[test]
    fn writes_manifest_to_output() {
        let dir = tempdir().unwrap();
        let chart = dir.path().join("mychart.tgz");
        let output = dir.path().join("Chart.yaml");
        fs::write(&chart, simple_chart(MANIFEST)).unwrap();

        let manifest = run(&chart, Some(&output), &ScanOptions::default()).unwrap();

        assert_eq!(manifest.entry_path, "mychart/Chart.yaml");
        assert_eq!(fs::read_to_string(&output).unwrap(), MANIFEST);
    }

    #[test]
    fn returns_manifest_without_output() {
        let dir = tempdir().unwrap();
        let chart = dir.path().join("mychart.tgz");
        fs::write(&chart, simple_chart(MANIFEST)).unwrap();

        let manifest = run(&chart, None, &ScanOptions::default()).unwrap();

        assert_eq!(manifest.data, MANIFEST.as_bytes());
    }

    #[test]
    fn unwritable_output_returns_error() {
        let dir = tempdir().unwrap();
        let chart = dir.path().join("mychart.tgz");
        fs::write(&chart, simple_chart(MANIFEST)).unwrap();

        let result = run(
            &chart,
            Some(Path::new("/nonexistent/dir/Chart.yaml")),
            &ScanOptions::default(),
        );

        assert!(matches!(result, Err(ChartError::Io { .. })));
    }
}
