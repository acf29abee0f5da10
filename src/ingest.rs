use std::path::Path;

use tracing::info;

use crate::coverages::Coverages;
use crate::detect::{detect_format, Format};
use crate::error::{CodegateError, Result};
use crate::readers::reader_for;

/// Read a coverage report, auto-detect its format (or use the override),
/// and fold every record into a fresh lattice.
pub fn ingest(file_path: &Path, format_override: Option<&str>) -> Result<(Coverages, Format)> {
    let content = std::fs::read(file_path)?;

    let format = if let Some(fmt_str) = format_override {
        fmt_str.parse::<Format>()?
    } else {
        detect_format(file_path, &content).ok_or(CodegateError::UnknownFormat)?
    };

    let records = reader_for(format).read(&content)?;
    let count = records.len();

    let mut coverages = Coverages::new();
    coverages.add_all(records)?;

    info!(
        path = %file_path.display(),
        format = %format,
        records = count,
        units = coverages.len(),
        "ingested coverage"
    );
    Ok((coverages, format))
}
