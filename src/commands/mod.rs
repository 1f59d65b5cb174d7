pub mod check;
pub mod extract;
pub mod metadata;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::ChartError;

fn open_chart(chart: &Path) -> Result<BufReader<File>, ChartError> {
    File::open(chart)
        .map(BufReader::new)
        .map_err(|e| ChartError::Io {
            path: chart.to_path_buf(),
            source: e,
        })
}
