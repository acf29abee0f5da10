//! Runs one backend and turns its raw output into an ordered, filtered list
//! of findings.

use std::cmp::Ordering;

use serde::{de, Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::collector::Collector;
use crate::error::{CodegateError, Result};
use crate::finding::Finding;
use crate::location::LocationMatcher;
use crate::rules::IgnoreRule;

/// Shared capability of every backend adapter.
pub trait Analyzer {
    fn name(&self) -> &str;

    fn analyze(&self) -> Result<AnalyzerResult>;
}

/// Output of one analyzer run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzerResult {
    pub analyzer: String,
    /// Accepted findings in canonical order.
    pub findings: Vec<Finding>,
    /// Locations the backend reported as analyzed.
    pub locations: Vec<String>,
    /// Suppression rules that matched nothing in this run.
    pub unused_rules: Vec<IgnoreRule>,
}

impl AnalyzerResult {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Severity ascending, then rank descending, then code.
pub fn canonical_order(a: &Finding, b: &Finding) -> Ordering {
    a.severity
        .cmp(&b.severity)
        .then_with(|| b.rank.cmp(&a.rank))
        .then_with(|| a.code.cmp(&b.code))
}

/// Which groups (packages, modules) an analyzer reports on.
///
/// A group passes when it matches some include pattern (or there are none)
/// and no exclude pattern. Only the container half of a pattern is used;
/// patterns naming a `#member` are rejected when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupFilter {
    #[serde(default, deserialize_with = "group_patterns")]
    pub include: Vec<LocationMatcher>,
    #[serde(default, deserialize_with = "group_patterns")]
    pub exclude: Vec<LocationMatcher>,
}

fn group_patterns<'de, D>(deserializer: D) -> std::result::Result<Vec<LocationMatcher>, D::Error>
where
    D: Deserializer<'de>,
{
    let patterns = Vec::<LocationMatcher>::deserialize(deserializer)?;
    if let Some(m) = patterns.iter().find(|m| m.member().is_some()) {
        return Err(de::Error::custom(format!(
            "group pattern '{m}' cannot name a member"
        )));
    }
    Ok(patterns)
}

impl GroupFilter {
    #[must_use]
    pub fn accept(&self, group: &str) -> bool {
        (self.include.is_empty() || self.include.iter().any(|m| m.matches_name(group)))
            && !self.exclude.iter().any(|m| m.matches_name(group))
    }
}

/// [`Analyzer`] over any [`Backend`].
pub struct BackendAnalyzer<B> {
    backend: B,
    roots: Vec<String>,
    collector: Collector,
    groups: GroupFilter,
}

impl<B: Backend> BackendAnalyzer<B> {
    pub fn new(backend: B, collector: Collector) -> Self {
        Self {
            backend,
            roots: Vec::new(),
            collector,
            groups: GroupFilter::default(),
        }
    }

    #[must_use]
    pub fn roots<I, S>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roots = roots.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn groups(mut self, groups: GroupFilter) -> Self {
        self.groups = groups;
        self
    }

    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    fn execution_error(&self, err: CodegateError) -> CodegateError {
        match err {
            CodegateError::BackendExecution { .. } => err,
            other => CodegateError::BackendExecution {
                analyzer: self.backend.name().to_string(),
                message: other.to_string(),
            },
        }
    }
}

impl<B: Backend> Analyzer for BackendAnalyzer<B> {
    fn name(&self) -> &str {
        self.backend.name()
    }

    fn analyze(&self) -> Result<AnalyzerResult> {
        let name = self.backend.name();
        info!(analyzer = name, roots = self.roots.len(), "running analyzer");

        let invocation = self
            .backend
            .invoke(&self.roots)
            .map_err(|e| self.execution_error(e))?;
        for diagnostic in &invocation.diagnostics {
            warn!(analyzer = name, "{diagnostic}");
        }

        let mut findings = invocation
            .findings
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                self.backend
                    .project(raw)
                    .map_err(|field| CodegateError::MalformedFinding {
                        analyzer: name.to_string(),
                        index,
                        field,
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        let raw_count = findings.len();

        // Stable, so equal keys keep backend order.
        findings.sort_by(|a, b| self.backend.compare(a, b));

        let unused_rules: Vec<IgnoreRule> = self
            .collector
            .unused_rules(&findings)
            .into_iter()
            .cloned()
            .collect();
        for rule in &unused_rules {
            warn!(analyzer = name, rule = %rule, "suppression rule matched nothing");
        }

        let findings: Vec<Finding> = findings
            .into_iter()
            .filter(|f| self.collector.accept(f) && self.groups.accept(f.group()))
            .collect();
        debug!(
            analyzer = name,
            raw = raw_count,
            kept = findings.len(),
            "filtered findings"
        );

        Ok(AnalyzerResult {
            analyzer: name.to_string(),
            findings,
            locations: invocation.locations,
            unused_rules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Invocation;
    use crate::finding::Severity;
    use crate::location::Location;
    use crate::rules::In;

    /// Backend that hands back canned records; `None` entries are malformed.
    struct Canned {
        findings: Vec<Option<Finding>>,
        fail: bool,
    }

    impl Backend for Canned {
        type Raw = Option<Finding>;

        fn name(&self) -> &str {
            "canned"
        }

        fn invoke(&self, roots: &[String]) -> Result<Invocation<Self::Raw>> {
            if self.fail {
                return Err(CodegateError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no input",
                )));
            }
            Ok(Invocation {
                findings: self.findings.clone(),
                locations: roots.to_vec(),
                diagnostics: vec![],
            })
        }

        fn project(&self, raw: Self::Raw) -> std::result::Result<Finding, &'static str> {
            raw.ok_or("code")
        }
    }

    fn f(container: &str, code: &str, severity: Severity, rank: i32) -> Finding {
        Finding::new(Location::new(container), code, severity).with_rank(rank)
    }

    #[test]
    fn test_rank_descends_within_severity() {
        let backend = Canned {
            findings: vec![
                Some(f("a.A", "X", Severity::MediumHigh, 5)),
                Some(f("a.B", "X", Severity::High, 5)),
                Some(f("a.C", "X", Severity::MediumHigh, 9)),
            ],
            fail: false,
        };
        let result = BackendAnalyzer::new(backend, Collector::new())
            .analyze()
            .unwrap();
        let order: Vec<&str> = result
            .findings
            .iter()
            .map(|f| f.location.container.as_str())
            .collect();
        assert_eq!(order, ["a.B", "a.C", "a.A"]);
    }

    #[test]
    fn test_code_breaks_ties_then_input_order() {
        let backend = Canned {
            findings: vec![
                Some(f("first", "B", Severity::High, 1)),
                Some(f("second", "A", Severity::High, 1)),
                Some(f("third", "A", Severity::High, 1)),
            ],
            fail: false,
        };
        let result = BackendAnalyzer::new(backend, Collector::new())
            .analyze()
            .unwrap();
        let order: Vec<&str> = result
            .findings
            .iter()
            .map(|f| f.location.container.as_str())
            .collect();
        assert_eq!(order, ["second", "third", "first"]);
    }

    #[test]
    fn test_collector_and_group_filter_both_apply() {
        let backend = Canned {
            findings: vec![
                Some(f("com.acme.Foo", "X", Severity::High, 0)),
                Some(f("com.acme.gen.Bar", "X", Severity::High, 0)),
                Some(f("org.other.Baz", "X", Severity::High, 0)),
                Some(f("com.acme.Qux", "SKIP", Severity::High, 0)),
            ],
            fail: false,
        };
        let collector = Collector::new().just([In::everywhere().ignore(["SKIP"])]);
        let groups = GroupFilter {
            include: vec!["com.acme*".parse().unwrap()],
            exclude: vec!["*.gen".parse().unwrap()],
        };
        let result = BackendAnalyzer::new(backend, collector)
            .groups(groups)
            .analyze()
            .unwrap();
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].location.container, "com.acme.Foo");
        assert!(result.unused_rules.is_empty());
    }

    #[test]
    fn test_backend_failure_is_wrapped() {
        let backend = Canned {
            findings: vec![],
            fail: true,
        };
        let err = BackendAnalyzer::new(backend, Collector::new())
            .analyze()
            .unwrap_err();
        match err {
            CodegateError::BackendExecution { analyzer, message } => {
                assert_eq!(analyzer, "canned");
                assert!(message.contains("no input"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_finding_fails_run() {
        let backend = Canned {
            findings: vec![Some(f("a.A", "X", Severity::High, 0)), None],
            fail: false,
        };
        let err = BackendAnalyzer::new(backend, Collector::new())
            .analyze()
            .unwrap_err();
        assert!(matches!(
            err,
            CodegateError::MalformedFinding { index: 1, field: "code", .. }
        ));
    }

    #[test]
    fn test_roots_are_reported_as_locations() {
        let backend = Canned {
            findings: vec![],
            fail: false,
        };
        let result = BackendAnalyzer::new(backend, Collector::new())
            .roots(["target/classes"])
            .analyze()
            .unwrap();
        assert_eq!(result.locations, ["target/classes"]);
        assert!(result.is_clean());
    }

    #[test]
    fn test_group_filter_rejects_member_patterns() {
        let err = serde_json::from_str::<GroupFilter>(r#"{"include": ["com.acme#foo"]}"#)
            .unwrap_err()
            .to_string();
        assert!(err.contains("com.acme#foo"), "{err}");
        assert!(serde_json::from_str::<GroupFilter>(r#"{"exclude": ["*#*"]}"#).is_err());

        let filter: GroupFilter =
            serde_json::from_str(r#"{"include": ["com.acme*"], "exclude": ["*.gen"]}"#).unwrap();
        assert!(filter.accept("com.acme.core"));
        assert!(!filter.accept("com.acme.gen"));
    }

    #[test]
    fn test_group_filter_default_accepts_all() {
        assert!(GroupFilter::default().accept(""));
        assert!(GroupFilter::default().accept("com.acme"));
    }
}
