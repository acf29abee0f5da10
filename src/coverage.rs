//! Immutable per-unit coverage measurement and its combination operator.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CodegateError, Result};

/// Compute a coverage rate, returning 0.0 when the total is zero.
#[must_use]
pub fn rate(covered: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64
    }
}

/// Shown for the rollup of units that have no group.
pub const DEFAULT_GROUP: &str = "<default>";

/// The counter a [`Coverage`] measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Instruction,
    Branch,
    Line,
    Complexity,
    Method,
}

impl MetricKind {
    pub const ALL: [MetricKind; 5] = [
        MetricKind::Instruction,
        MetricKind::Branch,
        MetricKind::Line,
        MetricKind::Complexity,
        MetricKind::Method,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Instruction => "instruction",
            MetricKind::Branch => "branch",
            MetricKind::Line => "line",
            MetricKind::Complexity => "complexity",
            MetricKind::Method => "method",
        }
    }
}

impl FromStr for MetricKind {
    type Err = CodegateError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        MetricKind::ALL
            .into_iter()
            .find(|k| k.as_str() == lower)
            .ok_or_else(|| CodegateError::Parse(format!("Unknown metric kind: '{s}'")))
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Natural key of a [`Coverage`] record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoverageKey {
    pub group: String,
    pub unit: String,
    pub kind: MetricKind,
}

/// Position of a [`Coverage`] in the lattice. Kept explicitly because an
/// empty group name is a real group (the default package).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Unit,
    Group,
    Global,
}

/// `covered` out of `total` for one metric of one unit, or a rollup of
/// several units as marked by its [`Level`].
///
/// Equality and ordering look at `(group, unit, kind)` and then the level.
#[derive(Debug, Clone, Serialize)]
pub struct Coverage {
    level: Level,
    group: String,
    unit: String,
    kind: MetricKind,
    covered: u64,
    total: u64,
}

impl Coverage {
    pub fn new(
        group: impl Into<String>,
        unit: impl Into<String>,
        kind: MetricKind,
        covered: u64,
        total: u64,
    ) -> Result<Self> {
        let coverage = Self {
            level: Level::Unit,
            group: group.into(),
            unit: unit.into(),
            kind,
            covered,
            total,
        };
        if covered > total {
            return Err(CodegateError::InvalidCoverage {
                key: coverage.describe(),
                covered,
                total,
            });
        }
        Ok(coverage)
    }

    /// From JaCoCo-style missed/covered counters.
    pub fn from_counters(
        group: impl Into<String>,
        unit: impl Into<String>,
        kind: MetricKind,
        missed: u64,
        covered: u64,
    ) -> Result<Self> {
        let total = missed.checked_add(covered).ok_or_else(|| {
            CodegateError::Parse(format!("{kind} counter overflow ({missed} + {covered})"))
        })?;
        Self::new(group, unit, kind, covered, total)
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn covered(&self) -> u64 {
        self.covered
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn missed(&self) -> u64 {
        self.total - self.covered
    }

    #[must_use]
    pub fn rate(&self) -> f64 {
        rate(self.covered, self.total)
    }

    pub fn key(&self) -> CoverageKey {
        CoverageKey {
            group: self.group.clone(),
            unit: self.unit.clone(),
            kind: self.kind,
        }
    }

    pub fn is_group_rollup(&self) -> bool {
        self.level == Level::Group
    }

    pub fn is_global(&self) -> bool {
        self.level == Level::Global
    }

    /// Same measurement with the unit cleared.
    #[must_use]
    pub fn without_unit(&self) -> Self {
        Self {
            level: self.level.max(Level::Group),
            unit: String::new(),
            ..self.clone()
        }
    }

    /// Same measurement with group and unit cleared.
    #[must_use]
    pub fn as_global(&self) -> Self {
        Self {
            level: Level::Global,
            group: String::new(),
            unit: String::new(),
            ..self.clone()
        }
    }

    /// Sum of both measurements. Group and unit are kept where both sides
    /// agree and cleared otherwise, and the level rises to match. Kinds must
    /// match and the sums must fit in a `u64`.
    pub fn combine(&self, other: &Coverage) -> Result<Self> {
        if self.kind != other.kind {
            return Err(self.mismatch(other, "metric kinds differ"));
        }
        let (Some(covered), Some(total)) = (
            self.covered.checked_add(other.covered),
            self.total.checked_add(other.total),
        ) else {
            return Err(self.mismatch(other, "counter overflow"));
        };
        let same_group = self.group == other.group;
        let same_unit = same_group && self.unit == other.unit;
        let level = if same_unit {
            self.level.max(other.level)
        } else if same_group {
            self.level.max(other.level).max(Level::Group)
        } else {
            Level::Global
        };
        Ok(Self {
            level,
            group: if same_group {
                self.group.clone()
            } else {
                String::new()
            },
            unit: if same_unit {
                self.unit.clone()
            } else {
                String::new()
            },
            kind: self.kind,
            covered,
            total,
        })
    }

    /// Like [`Coverage::combine`], for rollups that must stay inside one group.
    pub fn combine_in_group(&self, other: &Coverage) -> Result<Self> {
        if self.group != other.group {
            return Err(self.mismatch(other, "groups differ"));
        }
        self.combine(other)
    }

    /// Remove a previously combined measurement.
    pub(crate) fn retract(&self, other: &Coverage) -> Result<Self> {
        if self.kind != other.kind {
            return Err(self.mismatch(other, "metric kinds differ"));
        }
        match (
            self.covered.checked_sub(other.covered),
            self.total.checked_sub(other.total),
        ) {
            (Some(covered), Some(total)) if covered <= total => Ok(Self {
                covered,
                total,
                ..self.clone()
            }),
            _ => Err(self.mismatch(other, "not contained in this rollup")),
        }
    }

    /// Display name of the entry's scope, without the metric kind.
    pub fn scope_name(&self) -> String {
        match self.level {
            Level::Global => "<global>".to_string(),
            Level::Group if self.group.is_empty() => DEFAULT_GROUP.to_string(),
            Level::Group => self.group.clone(),
            Level::Unit if self.group.is_empty() => self.unit.clone(),
            Level::Unit => format!("{}.{}", self.group, self.unit),
        }
    }

    fn describe(&self) -> String {
        format!("{} [{}]", self.scope_name(), self.kind)
    }

    fn mismatch(&self, other: &Coverage, reason: &'static str) -> CodegateError {
        CodegateError::CoverageMismatch {
            left: self.describe(),
            right: other.describe(),
            reason,
        }
    }
}

impl PartialEq for Coverage {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Coverage {}

impl PartialOrd for Coverage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Coverage {
    fn cmp(&self, other: &Self) -> Ordering {
        self.group
            .cmp(&other.group)
            .then_with(|| self.unit.cmp(&other.unit))
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| self.level.cmp(&other.level))
    }
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}/{} ({:.1}%)",
            self.describe(),
            self.covered,
            self.total,
            self.rate() * 100.0
        )
    }
}
