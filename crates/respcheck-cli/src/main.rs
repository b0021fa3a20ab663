//! respcheck CLI - validate captured API responses against test expectations

mod step_file;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use respcheck_core::{
    AuditComparator, AuditSession, Dispatcher, ResponseValidator, ValidationConfig,
    ValidationReport, generate_schema,
};
use step_file::StepFile;

const CONFIG_FILE: &str = ".respcheck.toml";

#[derive(Parser)]
#[command(name = "respcheck")]
#[command(about = "Validate captured API responses against test expectations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Config file (default: .respcheck.toml in the current directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate each step in a step file against its captured response
    Validate {
        /// Step file (JSON, TOML or YAML)
        file: PathBuf,
    },

    /// Run the strict audit over the audit entries of a step file
    Audit {
        /// Step file (JSON, TOML or YAML)
        file: PathBuf,
    },

    /// Initialize config file
    Init,

    /// Export JSON Schema for the report format
    Schema,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ValidationConfig> {
    let config = match path {
        Some(path) => ValidationConfig::load(path)?,
        None => ValidationConfig::load_default()?,
    };
    debug!(
        source = %path.map_or_else(|| "default locations".to_string(), |p| p.display().to_string()),
        ignore_fields = config.ignore_fields.len(),
        partial_dict_match = config.partial_dict_match,
        ignore_array_order = config.ignore_array_order,
        "loaded validation config"
    );
    Ok(config)
}

fn load_steps(file: &Path) -> Result<StepFile> {
    let steps = StepFile::load(file)?;
    info!(
        file = %file.display(),
        steps = steps.steps.len(),
        audits = steps.audits.len(),
        "loaded step file"
    );
    Ok(steps)
}

fn run(cli: Cli) -> Result<u8> {
    match cli.command {
        Commands::Validate { file } => {
            let cfg = load_config(cli.config.as_deref())?;
            let steps = load_steps(&file)?;
            if steps.steps.is_empty() {
                anyhow::bail!("{} contains no steps", file.display());
            }

            let dispatcher = Dispatcher::new(cfg);
            let report = ValidationReport {
                outcomes: dispatcher.run_workflow(steps.cases()),
                ..ValidationReport::default()
            };
            info!(
                passed = report.outcomes.iter().filter(|o| o.passed).count(),
                total = report.outcomes.len(),
                "validation finished"
            );

            match cli.output {
                OutputFormat::Terminal => print_outcomes(&report),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Silent => {}
            }

            Ok(u8::from(!report.is_success()))
        }

        Commands::Audit { file } => {
            let cfg = load_config(cli.config.as_deref())?;
            let steps = load_steps(&file)?;
            if steps.audits.is_empty() {
                anyhow::bail!("{} contains no audit entries", file.display());
            }

            let standard = ResponseValidator::new(cfg.options());
            let session = AuditSession::new(AuditComparator::new(standard));
            for input in &steps.audits {
                session.audit(input);
            }
            let summary = session.summarize();
            let report = ValidationReport {
                audit_records: session.records(),
                audit_summary: Some(summary.clone()),
                ..ValidationReport::default()
            };

            match cli.output {
                OutputFormat::Terminal => print_audit(&report),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Silent => {}
            }

            Ok(if summary.errors > 0 {
                2
            } else {
                u8::from(summary.failed > 0)
            })
        }

        Commands::Init => {
            if Path::new(CONFIG_FILE).exists() {
                eprintln!("{CONFIG_FILE} already exists");
                return Ok(1);
            }

            std::fs::write(CONFIG_FILE, ValidationConfig::example())
                .with_context(|| format!("failed to write {CONFIG_FILE}"))?;
            println!("Created {CONFIG_FILE}");
            println!("\nEdit the file to configure:");
            println!("  - ignore_fields: fields dropped before structural comparison");
            println!("  - partial_dict_match: allow extra fields in responses");
            println!("  - ignore_array_order: compare arrays as multisets");
            Ok(0)
        }

        Commands::Schema => {
            println!("{}", generate_schema()?);
            Ok(0)
        }
    }
}

fn print_outcomes(report: &ValidationReport) {
    for outcome in &report.outcomes {
        let icon = if outcome.passed { "PASS" } else { "FAIL" };
        println!("{icon}: {} [{}] {}", outcome.step, outcome.strategy, outcome.reason);

        if let Some(verdict) = &outcome.verdict {
            if let Some(pct) = verdict.match_percentage {
                println!("  Structural match: {pct:.2}%");
            }
            for diff in &verdict.differences {
                println!("  - {diff}");
            }
            for note in &verdict.notes {
                println!("  note: {note}");
            }
        }
        for note in &outcome.notes {
            println!("  note: {note}");
        }
    }

    let passed = report.outcomes.iter().filter(|o| o.passed).count();
    println!("\n{passed}/{} steps passed", report.outcomes.len());
}

fn print_audit(report: &ValidationReport) {
    for record in &report.audit_records {
        println!("[{}] {}", record.overall_result, record.test_name);
        if let Some(detail) = &record.error_detail {
            println!("  error: {detail}");
        }
        for err in record
            .http_validation_errors
            .iter()
            .chain(&record.json_validation_errors)
        {
            println!("  - {err}");
        }
    }

    if let Some(summary) = &report.audit_summary {
        println!("\n{}", summary.render());
    }
}
