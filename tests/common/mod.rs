#![allow(dead_code)]

use std::path::{Path, PathBuf};

use codegate::coverage::{Coverage, MetricKind};
use codegate::finding::{Finding, Severity};
use codegate::location::Location;

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Write `content` into `dir` and return the full path.
pub fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

pub fn finding(container: &str, code: &str, severity: Severity) -> Finding {
    Finding::new(Location::new(container), code, severity)
}

pub fn line(group: &str, unit: &str, covered: u64, total: u64) -> Coverage {
    Coverage::new(group, unit, MetricKind::Line, covered, total).unwrap()
}
