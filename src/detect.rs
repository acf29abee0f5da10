/// Auto-detection of coverage report formats.
///
/// Strategy:
///   1. Check the file extension for a strong hint
///   2. Ask each reader whether it recognises the first bytes of the file
///   3. Fall back to the CLI --format override (handled by caller)
use std::path::Path;

use crate::error::CodegateError;
use crate::readers::reader_for;

/// Supported coverage report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    JacocoXml,
    JacocoCsv,
}

impl Format {
    pub const ALL: [Format; 2] = [Format::JacocoXml, Format::JacocoCsv];

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::JacocoXml => "jacoco-xml",
            Format::JacocoCsv => "jacoco-csv",
        }
    }
}

impl std::str::FromStr for Format {
    type Err = CodegateError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jacoco-xml" | "jacoco" | "xml" => Ok(Format::JacocoXml),
            "jacoco-csv" | "csv" => Ok(Format::JacocoCsv),
            _ => Err(CodegateError::Parse(format!(
                "Unknown format: '{}'. Supported: jacoco-xml, jacoco-csv",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the report format from filename and file content.
pub fn detect_format(path: &Path, content: &[u8]) -> Option<Format> {
    if let Some(fmt) = detect_by_extension(path, content) {
        return Some(fmt);
    }
    Format::ALL
        .into_iter()
        .find(|&fmt| reader_for(fmt).can_read(path, content))
}

fn detect_by_extension(path: &Path, content: &[u8]) -> Option<Format> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "csv" if reader_for(Format::JacocoCsv).can_read(path, content) => Some(Format::JacocoCsv),
        // XML needs content inspection
        _ => None,
    }
}
