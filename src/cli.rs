//! Command handler functions for the codegate CLI.
//!
//! Each `cmd_*` function returns its output as a [`CommandOutput`], making
//! them easy to test without capturing stdout.

use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::analyzer::{Analyzer, AnalyzerResult};
use crate::backend::command::CommandBackend;
use crate::backend::report::ReportFileBackend;
use crate::config::Config;
use crate::coverage::{Coverage, Level};
use crate::ingest;
use crate::limits::{check_limits, LimitViolation};

/// Rendered output plus whether the gate passed.
#[derive(Debug)]
pub struct CommandOutput {
    pub text: String,
    pub passed: bool,
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => Config::load(p).context("Failed to load configuration"),
        None => Ok(Config::default()),
    }
}

#[derive(Serialize)]
struct JsonEnvelope<T: Serialize> {
    generated_at: String,
    #[serde(flatten)]
    body: T,
}

fn to_json<T: Serialize>(body: T) -> Result<String> {
    let envelope = JsonEnvelope {
        generated_at: chrono::Utc::now().to_rfc3339(),
        body,
    };
    let mut s = serde_json::to_string_pretty(&envelope).context("render json")?;
    s.push('\n');
    Ok(s)
}

/// Filter the findings an external tool wrote to `report`.
pub fn cmd_findings(
    report: &Path,
    config: Option<&Path>,
    name: Option<&str>,
    json: bool,
) -> Result<CommandOutput> {
    let config = load_config(config)?;
    let name = match name {
        Some(n) => n.to_string(),
        None => report
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or("report")
            .to_string(),
    };
    let result = config.analyzer(ReportFileBackend::new(name, report)).analyze()?;
    render_findings(&result, json)
}

/// Run `program` as a backend and filter what it prints.
pub fn cmd_run(
    name: &str,
    program: &str,
    args: &[String],
    config: Option<&Path>,
    json: bool,
) -> Result<CommandOutput> {
    let config = load_config(config)?;
    let backend = CommandBackend::new(name, program).args(args.iter().cloned());
    let result = config.analyzer(backend).analyze()?;
    render_findings(&result, json)
}

fn render_findings(result: &AnalyzerResult, json: bool) -> Result<CommandOutput> {
    let passed = result.is_clean();
    if json {
        return Ok(CommandOutput {
            text: to_json(result)?,
            passed,
        });
    }

    let mut out = String::new();
    if result.findings.is_empty() {
        writeln!(out, "No findings from '{}'.", result.analyzer).unwrap();
    } else {
        writeln!(out, "{:<12} {:>5}  {:<32} LOCATION", "SEVERITY", "RANK", "CODE").unwrap();
        writeln!(out, "{}", "-".repeat(88)).unwrap();
        for f in &result.findings {
            writeln!(
                out,
                "{:<12} {:>5}  {:<32} {}",
                f.severity, f.rank, f.code, f.location
            )
            .unwrap();
            if !f.message.is_empty() {
                writeln!(out, "{:>20}{}", "", f.message).unwrap();
            }
        }
        writeln!(
            out,
            "\n{} finding(s) from '{}'.",
            result.findings.len(),
            result.analyzer
        )
        .unwrap();
    }

    if !result.unused_rules.is_empty() {
        out.push('\n');
        for rule in &result.unused_rules {
            writeln!(out, "Unused suppression: {rule}").unwrap();
        }
    }

    Ok(CommandOutput { text: out, passed })
}

#[derive(Serialize)]
struct CoverageBody<'a> {
    format: String,
    coverage: Vec<&'a Coverage>,
    violations: &'a [LimitViolation],
}

/// Summarize a coverage report and check configured limits.
pub fn cmd_coverage(
    file: &Path,
    format: Option<&str>,
    config: Option<&Path>,
    json: bool,
) -> Result<CommandOutput> {
    let config = load_config(config)?;
    let (coverages, detected) = ingest::ingest(file, format)
        .with_context(|| format!("Failed to read coverage from {}", file.display()))?;
    let violations = check_limits(&coverages, &config.coverage_limits);
    let passed = violations.is_empty();

    if json {
        let body = CoverageBody {
            format: detected.to_string(),
            coverage: coverages.query().collect(),
            violations: &violations,
        };
        return Ok(CommandOutput {
            text: to_json(body)?,
            passed,
        });
    }

    let mut out = String::new();
    if coverages.is_empty() {
        writeln!(out, "No coverage records in {}.", file.display()).unwrap();
        return Ok(CommandOutput { text: out, passed });
    }

    writeln!(
        out,
        "{:<50} {:<12} {:>9} {:>9} {:>8}",
        "SCOPE", "KIND", "COVERED", "TOTAL", "RATE"
    )
    .unwrap();
    writeln!(out, "{}", "-".repeat(92)).unwrap();
    for c in coverages.query() {
        let scope = match c.level() {
            Level::Unit => format!("  {}", c.scope_name()),
            Level::Group | Level::Global => c.scope_name(),
        };
        writeln!(
            out,
            "{:<50} {:<12} {:>9} {:>9} {:>7.1}%",
            scope,
            c.kind(),
            c.covered(),
            c.total(),
            c.rate() * 100.0
        )
        .unwrap();
    }

    if !violations.is_empty() {
        out.push('\n');
        for v in &violations {
            writeln!(
                out,
                "Coverage below limit: {} (minimum {:.1}%)",
                v.coverage, v.min
            )
            .unwrap();
        }
    }

    Ok(CommandOutput { text: out, passed })
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"[
        {"container": "com.acme.Parser", "member": "parse", "code": "NP_NULL", "severity": "high", "rank": 3, "message": "possible null"},
        {"container": "com.acme.ParserTest", "code": "NP_NULL", "severity": "high"},
        {"container": "org.other.Util", "code": "STYLE", "severity": "low"}
    ]"#;

    const CONFIG: &str = r#"{
        "min_severity": "medium",
        "ignore": [
            { "in": ["*Test"], "codes": "*" },
            { "in": ["nowhere.*"], "codes": ["X"] }
        ],
        "coverage_limits": [ { "scope": "global", "kind": "line", "min": 60 } ]
    }"#;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_cmd_findings_text() {
        let dir = tempfile::tempdir().unwrap();
        let report = write(&dir, "spotbugs.json", REPORT);
        let config = write(&dir, "codegate.json", CONFIG);

        let out = cmd_findings(&report, Some(&config), None, false).unwrap();

        assert!(!out.passed);
        assert!(out.text.contains("NP_NULL"));
        assert!(out.text.contains("com.acme.Parser#parse"));
        assert!(out.text.contains("possible null"));
        assert!(!out.text.contains("ParserTest"));
        assert!(!out.text.contains("org.other.Util"));
        assert!(out.text.contains("1 finding(s) from 'spotbugs'."));
        assert!(out.text.contains("Unused suppression: nowhere.* ignore [X]"));
    }

    #[test]
    fn test_cmd_findings_clean_without_config() {
        let dir = tempfile::tempdir().unwrap();
        let report = write(&dir, "empty.json", "[]");

        let out = cmd_findings(&report, None, Some("pmd"), false).unwrap();

        assert!(out.passed);
        assert!(out.text.contains("No findings from 'pmd'."));
    }

    #[test]
    fn test_cmd_findings_json() {
        let dir = tempfile::tempdir().unwrap();
        let report = write(&dir, "spotbugs.json", REPORT);
        let config = write(&dir, "codegate.json", CONFIG);

        let out = cmd_findings(&report, Some(&config), None, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out.text).unwrap();

        assert!(value["generated_at"].is_string());
        assert_eq!(value["analyzer"], "spotbugs");
        assert_eq!(value["findings"].as_array().unwrap().len(), 1);
        assert_eq!(value["findings"][0]["severity"], "high");
        assert_eq!(value["unused_rules"][0]["codes"][0], "X");
    }

    #[test]
    fn test_cmd_findings_missing_report() {
        let dir = tempfile::tempdir().unwrap();
        let result = cmd_findings(&dir.path().join("nope.json"), None, None, false);
        assert!(result.is_err());
    }

    #[test]
    fn test_cmd_findings_malformed_record() {
        let dir = tempfile::tempdir().unwrap();
        let report = write(&dir, "bad.json", r#"[{"container": "a.B", "severity": "high"}]"#);
        let err = cmd_findings(&report, None, None, false).unwrap_err();
        assert!(format!("{err:#}").contains("missing code"));
    }

    #[cfg(unix)]
    #[test]
    fn test_cmd_run() {
        let args = vec![
            "-c".to_string(),
            r#"echo '[{"container":"a.B","code":"X","severity":"medium"}]'"#.to_string(),
        ];
        let out = cmd_run("sh-lint", "sh", &args, None, false).unwrap();
        assert!(!out.passed);
        assert!(out.text.contains("1 finding(s) from 'sh-lint'."));
    }

    #[test]
    fn test_cmd_coverage_text() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write(
            &dir,
            "jacoco.csv",
            "GROUP,PACKAGE,CLASS,LINE_MISSED,LINE_COVERED\n\
             app,pkg.a,A,2,8\n\
             app,pkg.a,B,3,2\n\
             app,pkg.b,C,3,0\n",
        );
        let config = write(&dir, "codegate.json", CONFIG);

        let out = cmd_coverage(&csv, None, Some(&config), false).unwrap();

        assert!(out.text.contains("<global>"));
        assert!(out.text.contains("55.6%"));
        assert!(out.text.contains("pkg.a.B"));
        // 10/18 is below the 60% global limit
        assert!(!out.passed);
        assert!(out.text.contains("Coverage below limit"));
    }

    #[test]
    fn test_cmd_coverage_default_package() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write(
            &dir,
            "jacoco.csv",
            "GROUP,PACKAGE,CLASS,LINE_MISSED,LINE_COVERED\n\
             app,,Main,10,0\n\
             app,com.a,Foo,0,90\n",
        );
        let config = write(&dir, "codegate.json", CONFIG);

        let out = cmd_coverage(&csv, None, Some(&config), false).unwrap();

        assert_eq!(out.text.matches("<global>").count(), 1);
        assert!(out.text.contains("<default>"));
        assert!(out.text.contains("  Main"));
        // 90/100 clears the 60% global limit
        assert!(out.passed, "{}", out.text);
    }

    #[test]
    fn test_cmd_coverage_json() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write(
            &dir,
            "jacoco.csv",
            "PACKAGE,CLASS,LINE_MISSED,LINE_COVERED\npkg.a,A,0,4\n",
        );

        let out = cmd_coverage(&csv, Some("jacoco-csv"), None, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out.text).unwrap();

        assert!(out.passed);
        assert_eq!(value["format"], "jacoco-csv");
        // global, group, unit
        assert_eq!(value["coverage"].as_array().unwrap().len(), 3);
        assert_eq!(value["coverage"][2]["unit"], "A");
        assert_eq!(value["coverage"][2]["covered"], 4);
    }
}
