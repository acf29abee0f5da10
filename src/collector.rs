//! The suppression + minimum-severity filter shared by every analyzer.

use tracing::trace;

use crate::finding::{Finding, Severity};
use crate::rules::IgnoreRule;

/// Why a finding was accepted or rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accepted,
    BelowThreshold { severity: Severity, min: Severity },
    /// Index of the first matching rule, in insertion order.
    Suppressed { rule: usize },
}

impl Decision {
    pub fn is_accepted(self) -> bool {
        self == Decision::Accepted
    }
}

/// Immutable rule set plus severity threshold.
///
/// The accept decision only asks whether *any* rule matches, so rule order
/// never changes the outcome. Order is kept for [`Collector::explain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collector {
    rules: Vec<IgnoreRule>,
    min_severity: Severity,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector {
    /// No rules, lowest threshold: accepts everything.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            min_severity: Severity::Low,
        }
    }

    #[must_use]
    pub fn min_severity(&self, min_severity: Severity) -> Self {
        Self {
            rules: self.rules.clone(),
            min_severity,
        }
    }

    /// A copy with a shared preset appended.
    #[must_use]
    pub fn apply(&self, preset: &[IgnoreRule]) -> Self {
        self.just(preset.iter().cloned())
    }

    /// A copy with additional rules appended.
    #[must_use]
    pub fn just<I>(&self, rules: I) -> Self
    where
        I: IntoIterator<Item = IgnoreRule>,
    {
        let mut all = self.rules.clone();
        all.extend(rules);
        Self {
            rules: all,
            min_severity: self.min_severity,
        }
    }

    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    pub fn threshold(&self) -> Severity {
        self.min_severity
    }

    #[must_use]
    pub fn accept(&self, finding: &Finding) -> bool {
        self.explain(finding).is_accepted()
    }

    #[must_use]
    pub fn explain(&self, finding: &Finding) -> Decision {
        if finding.severity.is_below(self.min_severity) {
            trace!(code = %finding.code, severity = %finding.severity, "below threshold");
            return Decision::BelowThreshold {
                severity: finding.severity,
                min: self.min_severity,
            };
        }
        match self.rules.iter().position(|rule| rule.matches(finding)) {
            Some(rule) => {
                trace!(
                    code = %finding.code,
                    location = %finding.location,
                    rule = %self.rules[rule],
                    "suppressed"
                );
                Decision::Suppressed { rule }
            }
            None => Decision::Accepted,
        }
    }

    /// Rules that suppress none of `findings`. Findings below the threshold
    /// are not considered, since no rule is needed to drop them.
    pub fn unused_rules<'a, I>(&self, findings: I) -> Vec<&IgnoreRule>
    where
        I: IntoIterator<Item = &'a Finding>,
    {
        let mut used = vec![false; self.rules.len()];
        for finding in findings {
            if finding.severity.is_below(self.min_severity) {
                continue;
            }
            for (i, rule) in self.rules.iter().enumerate() {
                if !used[i] && rule.matches(finding) {
                    used[i] = true;
                }
            }
        }
        self.rules
            .iter()
            .zip(used)
            .filter_map(|(rule, used)| (!used).then_some(rule))
            .collect()
    }
}
