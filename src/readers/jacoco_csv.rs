/// Reader for JaCoCo CSV reports (`jacoco.csv`).
///
///   GROUP,PACKAGE,CLASS,INSTRUCTION_MISSED,INSTRUCTION_COVERED,BRANCH_MISSED,
///   BRANCH_COVERED,LINE_MISSED,LINE_COVERED,COMPLEXITY_MISSED,COMPLEXITY_COVERED,
///   METHOD_MISSED,METHOD_COVERED
///
/// Columns are located by header name, so reordered or partial exports work
/// as long as PACKAGE and CLASS are present. JaCoCo never quotes fields.
use std::path::Path;

use super::{CoverageReader, Format};
use crate::coverage::{Coverage, MetricKind};
use crate::error::{CodegateError, Result};

pub struct JacocoCsvReader;

impl CoverageReader for JacocoCsvReader {
    fn format(&self) -> Format {
        Format::JacocoCsv
    }

    fn can_read(&self, path: &Path, content: &[u8]) -> bool {
        let head = super::sniff_head(content);
        let header_ok = head
            .lines()
            .next()
            .map(|l| l.trim().starts_with("GROUP,PACKAGE,CLASS"))
            .unwrap_or(false);
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        header_ok || (is_csv && content.is_empty())
    }

    fn read(&self, input: &[u8]) -> Result<Vec<Coverage>> {
        parse(input)
    }
}

/// Column indices of one metric's missed/covered pair.
struct MetricColumns {
    kind: MetricKind,
    missed: usize,
    covered: usize,
}

/// Parse JaCoCo CSV into per-class coverage records.
pub fn parse(input: &[u8]) -> Result<Vec<Coverage>> {
    let text = std::str::from_utf8(input)
        .map_err(|e| CodegateError::Parse(format!("Invalid UTF-8 in JaCoCo CSV: {e}")))?;
    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

    let header: Vec<&str> = match lines.next() {
        Some((_, line)) => line.trim().split(',').map(str::trim).collect(),
        None => return Ok(Vec::new()),
    };
    let column = |name: &str| header.iter().position(|h| h.eq_ignore_ascii_case(name));

    let package_col = column("PACKAGE")
        .ok_or_else(|| CodegateError::Parse("JaCoCo CSV header has no PACKAGE column".into()))?;
    let class_col = column("CLASS")
        .ok_or_else(|| CodegateError::Parse("JaCoCo CSV header has no CLASS column".into()))?;
    let metrics: Vec<MetricColumns> = MetricKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let prefix = kind.as_str().to_uppercase();
            Some(MetricColumns {
                kind,
                missed: column(&format!("{prefix}_MISSED"))?,
                covered: column(&format!("{prefix}_COVERED"))?,
            })
        })
        .collect();

    let mut records = Vec::new();
    for (index, line) in lines {
        let line_no = index + 1;
        let fields: Vec<&str> = line.trim().split(',').map(str::trim).collect();
        if fields.len() != header.len() {
            return Err(CodegateError::Parse(format!(
                "JaCoCo CSV line {line_no}: expected {} fields, found {}",
                header.len(),
                fields.len()
            )));
        }
        let package = fields[package_col];
        let class = fields[class_col];
        for m in &metrics {
            let count = |col: usize| -> Result<u64> {
                fields[col].parse().map_err(|_| {
                    CodegateError::Parse(format!(
                        "JaCoCo CSV line {line_no}: invalid count '{}' in column {}",
                        fields[col], header[col]
                    ))
                })
            };
            records.push(Coverage::from_counters(
                package,
                class,
                m.kind,
                count(m.missed)?,
                count(m.covered)?,
            )?);
        }
    }
    Ok(records)
}
