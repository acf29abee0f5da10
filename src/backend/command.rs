//! Backend that runs an external program and reads JSON findings from its
//! standard output. The analysis roots are appended to the argument list.

use std::process::Command;

use tracing::debug;

use super::{parse_report, Backend, Invocation, RawFinding};
use crate::error::{CodegateError, Result};
use crate::finding::Finding;

pub struct CommandBackend {
    name: String,
    program: String,
    args: Vec<String>,
}

impl CommandBackend {
    pub fn new(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn failure(&self, message: String) -> CodegateError {
        CodegateError::BackendExecution {
            analyzer: self.name.clone(),
            message,
        }
    }
}

impl Backend for CommandBackend {
    type Raw = RawFinding;

    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, roots: &[String]) -> Result<Invocation<RawFinding>> {
        debug!(program = %self.program, args = ?self.args, "spawning backend");
        let output = Command::new(&self.program)
            .args(&self.args)
            .args(roots)
            .output()
            .map_err(|e| self.failure(format!("failed to run {}: {e}", self.program)))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(self.failure(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let mut invocation = parse_report(&output.stdout, roots)
            .map_err(|e| self.failure(format!("unreadable output from {}: {e}", self.program)))?;
        invocation.diagnostics = stderr
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        Ok(invocation)
    }

    fn project(&self, raw: RawFinding) -> std::result::Result<Finding, &'static str> {
        raw.into_finding()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandBackend {
        CommandBackend::new("sh", "sh").args(["-c", script, "sh"])
    }

    #[test]
    fn test_reads_stdout_and_stderr() {
        let backend = sh(
            r#"echo '[{"container":"a.B","code":"X","severity":1}]'; echo "warning: slow" >&2"#,
        );
        let inv = backend.invoke(&["src".to_string()]).unwrap();
        assert_eq!(inv.findings.len(), 1);
        assert_eq!(inv.diagnostics, ["warning: slow"]);
        assert_eq!(inv.locations, ["src"]);
    }

    #[test]
    fn test_roots_are_passed_as_arguments() {
        let backend = sh(r#"printf '{"locations":["%s"],"findings":[]}' "$1""#);
        let inv = backend.invoke(&["lib/main".to_string()]).unwrap();
        assert_eq!(inv.locations, ["lib/main"]);
    }

    #[test]
    fn test_non_zero_exit_is_execution_failure() {
        let err = sh("echo boom >&2; exit 3").invoke(&[]).unwrap_err();
        match err {
            CodegateError::BackendExecution { analyzer, message } => {
                assert_eq!(analyzer, "sh");
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_program() {
        let err = CommandBackend::new("ghost", "definitely-not-a-real-program-xyz")
            .invoke(&[])
            .unwrap_err();
        assert!(matches!(err, CodegateError::BackendExecution { .. }));
    }
}
