pub mod command;
pub mod report;

use std::cmp::Ordering;

use serde::Deserialize;

use crate::analyzer::canonical_order;
use crate::error::Result;
use crate::finding::{Finding, Severity};
use crate::location::Location;

/// What one backend invocation produced.
#[derive(Debug, Clone, Default)]
pub struct Invocation<R> {
    pub findings: Vec<R>,
    pub locations: Vec<String>,
    /// Free-form messages from the tool, logged but otherwise ignored.
    pub diagnostics: Vec<String>,
}

/// Adapter around one external analysis tool.
pub trait Backend {
    /// The tool's native record type.
    type Raw;

    fn name(&self) -> &str;

    /// Run the tool over `roots`.
    fn invoke(&self, roots: &[String]) -> Result<Invocation<Self::Raw>>;

    /// Project a native record into a [`Finding`]. On failure, returns the
    /// name of the missing field.
    fn project(&self, raw: Self::Raw) -> std::result::Result<Finding, &'static str>;

    fn compare(&self, a: &Finding, b: &Finding) -> Ordering {
        canonical_order(a, b)
    }
}

/// JSON record shared by the shipped backends. Every field is optional on
/// the wire so that a missing one is reported rather than rejected by serde.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFinding {
    pub container: Option<String>,
    pub member: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub code: Option<String>,
    pub severity: Option<Severity>,
    #[serde(default)]
    pub rank: i32,
    #[serde(default)]
    pub message: String,
}

impl RawFinding {
    pub fn into_finding(self) -> std::result::Result<Finding, &'static str> {
        let container = self.container.filter(|c| !c.is_empty()).ok_or("location")?;
        let code = self.code.filter(|c| !c.is_empty()).ok_or("code")?;
        let severity = self.severity.ok_or("severity")?;

        let mut location = Location::new(container);
        location.member = self.member;
        location.file = self.file;
        location.line = self.line;

        Ok(Finding::new(location, code, severity)
            .with_rank(self.rank)
            .with_message(self.message))
    }
}

/// Either a bare array of findings or an object that also lists the
/// analyzed locations.
#[derive(Deserialize)]
#[serde(untagged)]
enum ReportRepr {
    Findings(Vec<RawFinding>),
    Full {
        #[serde(default)]
        locations: Vec<String>,
        findings: Vec<RawFinding>,
    },
}

/// Decode a tool's JSON output. Locations fall back to `roots` when the
/// tool does not report them.
pub(crate) fn parse_report(input: &[u8], roots: &[String]) -> Result<Invocation<RawFinding>> {
    let (findings, locations) = match serde_json::from_slice::<ReportRepr>(input)? {
        ReportRepr::Findings(findings) => (findings, roots.to_vec()),
        ReportRepr::Full {
            locations,
            findings,
        } if locations.is_empty() => (findings, roots.to_vec()),
        ReportRepr::Full {
            locations,
            findings,
        } => (findings, locations),
    };
    Ok(Invocation {
        findings,
        locations,
        diagnostics: Vec::new(),
    })
}
