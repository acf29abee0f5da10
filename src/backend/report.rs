//! Backend reading a JSON findings file that an external tool already wrote.

use std::path::PathBuf;

use tracing::debug;

use super::{parse_report, Backend, Invocation, RawFinding};
use crate::error::{CodegateError, Result};
use crate::finding::Finding;

pub struct ReportFileBackend {
    name: String,
    path: PathBuf,
}

impl ReportFileBackend {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

impl Backend for ReportFileBackend {
    type Raw = RawFinding;

    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, roots: &[String]) -> Result<Invocation<RawFinding>> {
        debug!(path = %self.path.display(), "reading findings report");
        let content = std::fs::read(&self.path).map_err(|e| CodegateError::BackendExecution {
            analyzer: self.name.clone(),
            message: format!("cannot read {}: {e}", self.path.display()),
        })?;
        parse_report(&content, roots).map_err(|e| CodegateError::BackendExecution {
            analyzer: self.name.clone(),
            message: format!("invalid report {}: {e}", self.path.display()),
        })
    }

    fn project(&self, raw: RawFinding) -> std::result::Result<Finding, &'static str> {
        raw.into_finding()
    }
}
