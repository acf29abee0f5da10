//! Minimum coverage requirements checked against a [`Coverages`] lattice.

use serde::{Deserialize, Serialize};

use crate::coverage::{Coverage, Level, MetricKind};
use crate::coverages::Coverages;
use crate::location::LocationMatcher;

/// Which lattice entries a limit applies to. Unit patterns are matched
/// against `group.unit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "lowercase")]
pub enum LimitScope {
    Global,
    Group { pattern: LocationMatcher },
    Unit { pattern: LocationMatcher },
}

impl LimitScope {
    fn applies_to(&self, entry: &Coverage) -> bool {
        match self {
            LimitScope::Global => entry.is_global(),
            LimitScope::Group { pattern } => {
                entry.is_group_rollup() && pattern.matches_name(entry.group())
            }
            LimitScope::Unit { pattern } => {
                if entry.level() != Level::Unit {
                    return false;
                }
                if entry.group().is_empty() {
                    pattern.matches_name(entry.unit())
                } else {
                    pattern.matches_name(&format!("{}.{}", entry.group(), entry.unit()))
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageLimit {
    #[serde(flatten)]
    pub scope: LimitScope,
    pub kind: MetricKind,
    /// Minimum coverage in percent.
    pub min: f64,
}

impl CoverageLimit {
    pub fn global(kind: MetricKind, min: f64) -> Self {
        Self {
            scope: LimitScope::Global,
            kind,
            min,
        }
    }

    pub fn groups(pattern: LocationMatcher, kind: MetricKind, min: f64) -> Self {
        Self {
            scope: LimitScope::Group { pattern },
            kind,
            min,
        }
    }

    pub fn units(pattern: LocationMatcher, kind: MetricKind, min: f64) -> Self {
        Self {
            scope: LimitScope::Unit { pattern },
            kind,
            min,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LimitViolation {
    pub coverage: Coverage,
    pub min: f64,
    pub actual: f64,
}

/// Every (entry, limit) pair where the entry falls short, in lattice query
/// order and then limit order. Entries with nothing to cover never fail.
pub fn check_limits(coverages: &Coverages, limits: &[CoverageLimit]) -> Vec<LimitViolation> {
    let mut violations = Vec::new();
    for entry in coverages.query() {
        if entry.total() == 0 {
            continue;
        }
        let actual = entry.rate() * 100.0;
        for limit in limits {
            if limit.kind == entry.kind() && limit.scope.applies_to(entry) && actual < limit.min {
                violations.push(LimitViolation {
                    coverage: entry.clone(),
                    min: limit.min,
                    actual,
                });
            }
        }
    }
    violations
}
