use std::path::Path;

use crate::commands::open_chart;
use crate::error::ChartError;
use crate::loader::MetadataLoader;
use crate::metadata::Metadata;

/// Load metadata from the chart archive at `chart`, applying `patch` if given.
pub fn run(
    chart: &Path,
    patch: Option<&Path>,
    loader: &MetadataLoader,
) -> Result<Metadata, ChartError> {
    let reader = open_chart(chart)?;
    loader.load(reader, patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::PatchStrategy;
    use crate::test::simple_chart;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn loads_metadata_from_chart_file() {
        let dir = tempdir().unwrap();
        let chart = dir.path().join("mychart-1.0.0.tgz");
        fs::write(&chart, simple_chart("name: mychart\nversion: 1.0.0\n")).unwrap();

        let metadata = run(&chart, None, &MetadataLoader::default()).unwrap();

        assert_eq!(metadata.name, "mychart");
    }

    #[test]
    fn applies_name_directive() {
        let dir = tempdir().unwrap();
        let chart = dir.path().join("mychart-1.0.0.tgz");
        let patch = dir.path().join("Chart.yaml.patch");
        fs::write(&chart, simple_chart("name: mychart\nversion: 1.0.0\n")).unwrap();
        fs::write(&patch, "-name: mychart\n+name: rancher-mychart\n").unwrap();
        let loader = MetadataLoader::new(PatchStrategy::DirectiveScan);

        let metadata = run(&chart, Some(&patch), &loader).unwrap();

        assert_eq!(metadata.name, "rancher-mychart");
    }

    #[test]
    fn nonexistent_chart_returns_error() {
        let result = run(
            Path::new("/nonexistent/chart.tgz"),
            None,
            &MetadataLoader::default(),
        );

        assert!(matches!(result, Err(ChartError::Io { .. })));
    }
}
