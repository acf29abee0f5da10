use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use codegate::cli::{self, CommandOutput};

/// Filter static-analysis findings and roll up coverage.
#[derive(Parser)]
#[command(name = "codegate", version, about)]
struct Cli {
    /// Path to a JSON configuration file (rules, thresholds, limits).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of a table.
    #[arg(long, global = true)]
    json: bool,

    /// Log analyzer progress.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Log every suppression decision.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter a JSON findings file written by an external tool.
    Findings {
        /// Path to the findings file.
        report: PathBuf,

        /// Analyzer name used in output (default: file stem).
        #[arg(long)]
        name: Option<String>,
    },

    /// Run an external tool that prints JSON findings and filter its output.
    Run {
        /// Analyzer name used in output.
        #[arg(long)]
        name: String,

        /// Program to run.
        program: String,

        /// Arguments for the program; configured roots are appended.
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Summarize a coverage report and check configured limits.
    Coverage {
        /// Path to the coverage report.
        file: PathBuf,

        /// Override format detection (jacoco-xml, jacoco-csv).
        #[arg(long)]
        format: Option<String>,
    },
}

fn main() -> Result<ExitCode> {
    let opts = Cli::parse();
    init_logging(opts.verbose, opts.debug);

    let config = opts.config.as_deref();
    let json = opts.json;
    let output = match opts.command {
        Commands::Findings { report, name } => {
            cli::cmd_findings(&report, config, name.as_deref(), json)
        }
        Commands::Run {
            name,
            program,
            args,
        } => cli::cmd_run(&name, &program, &args, config, json),
        Commands::Coverage { file, format } => {
            cli::cmd_coverage(&file, format.as_deref(), config, json)
        }
    }?;

    finish(output)
}

fn finish(output: CommandOutput) -> Result<ExitCode> {
    print!("{}", output.text);
    Ok(if output.passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Initialize tracing based on CLI flags; `RUST_LOG` takes precedence.
fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if debug {
        "trace"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    debug!("Logging initialized at level: {}", level);
}
