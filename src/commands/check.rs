use std::path::{Path, PathBuf};

use log::warn;

use crate::commands::open_chart;
use crate::error::ChartError;
use crate::loader::MetadataLoader;
use crate::utils::report::save_lines;

/// Report file listing charts without a rancher-version annotation
pub const NO_RANCHER_VERSION_FILE: &str = "no-rancher-version.txt";
/// Report file listing charts without a kube-version annotation
pub const NO_KUBE_VERSION_FILE: &str = "no-kube-version.txt";

/// Outcome of checking a set of charts for catalog annotations.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub checked: usize,
    /// `name-version` of visible charts missing the rancher-version annotation
    pub no_rancher_version: Vec<String>,
    /// `name-version` of visible charts missing the kube-version annotation
    pub no_kube_version: Vec<String>,
    /// Charts whose metadata could not be loaded, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.no_rancher_version.is_empty()
            && self.no_kube_version.is_empty()
            && self.failed.is_empty()
    }
}

/// Check every chart in `charts` and, if `out_dir` is given, save the
/// missing-annotation lists there.
///
/// Hidden charts are exempt. A chart that fails to load is recorded in
/// [`CheckReport::failed`] and does not stop the run.
pub fn run(
    charts: &[PathBuf],
    loader: &MetadataLoader,
    out_dir: Option<&Path>,
) -> Result<CheckReport, ChartError> {
    let mut report = CheckReport::default();

    for chart in charts {
        let metadata = match open_chart(chart).and_then(|reader| loader.load(reader, None)) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("skipping {}: {}", chart.display(), e);
                report.failed.push((chart.clone(), e.to_string()));
                continue;
            }
        };
        report.checked += 1;

        if metadata.is_hidden() {
            continue;
        }
        let id = format!("{}-{}", metadata.name, metadata.version);
        if metadata.rancher_version().is_none() {
            report.no_rancher_version.push(id.clone());
        }
        if metadata.catalog_kube_version().is_none() {
            report.no_kube_version.push(id);
        }
    }

    if let Some(out_dir) = out_dir {
        for (file, lines) in [
            (NO_RANCHER_VERSION_FILE, &report.no_rancher_version),
            (NO_KUBE_VERSION_FILE, &report.no_kube_version),
        ] {
            let path = out_dir.join(file);
            save_lines(&path, lines).map_err(|e| ChartError::Io { path, source: e })?;
        }
    }

    Ok(report)
}
