//! JSON configuration: analysis roots, severity threshold, group filter,
//! suppression rules and coverage limits. Every field is optional; the
//! default configuration accepts everything.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzer::{BackendAnalyzer, GroupFilter};
use crate::backend::Backend;
use crate::collector::Collector;
use crate::error::{CodegateError, Result};
use crate::finding::Severity;
use crate::limits::CoverageLimit;
use crate::rules::IgnoreRule;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub roots: Vec<String>,
    pub min_severity: Severity,
    pub groups: GroupFilter,
    pub ignore: Vec<IgnoreRule>,
    pub coverage_limits: Vec<CoverageLimit>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CodegateError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_json(&text)
            .map_err(|e| CodegateError::Config(format!("{}: {e}", path.display())))?;
        debug!(
            path = %path.display(),
            rules = config.ignore.len(),
            limits = config.coverage_limits.len(),
            "loaded configuration"
        );
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for limit in &self.coverage_limits {
            if !(0.0..=100.0).contains(&limit.min) {
                return Err(CodegateError::Config(format!(
                    "coverage limit for {} must be between 0 and 100, got {}",
                    limit.kind, limit.min
                )));
            }
        }
        Ok(())
    }

    pub fn collector(&self) -> Collector {
        Collector::new()
            .min_severity(self.min_severity)
            .apply(&self.ignore)
    }

    /// An analyzer over `backend` wired with this configuration.
    pub fn analyzer<B: Backend>(&self, backend: B) -> BackendAnalyzer<B> {
        BackendAnalyzer::new(backend, self.collector())
            .roots(self.roots.iter().cloned())
            .groups(self.groups.clone())
    }
}
