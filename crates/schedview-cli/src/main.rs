//! schedview CLI - schedule spreadsheet ingestion and Gantt layout
//!
//! Checks exported schedules, re-exports them as filtered CSV, and prints the
//! chart layout for a viewport as JSON.

mod diagnostics;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use schedview_core::{Ingested, SchedviewConfig};
use schedview_layout::{write_csv, LayoutSnapshot, SortDirection, TableQuery, TableSummary, ViewportInput};
use schedview_parser::{decode_file, ingest, parse_date, Row};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use diagnostics::{DiagnosticConfig, Emitter, ExitCode, JsonEmitter, TerminalEmitter};

#[derive(Parser)]
#[command(name = "schedview")]
#[command(author, version, about = "Schedule spreadsheet ingestion and Gantt layout", long_about = None)]
struct Cli {
    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML file overriding layout and file settings
    #[arg(long, value_name = "FILE", env = "SCHEDVIEW_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a schedule and print the processing report
    Check {
        /// Input file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Only print errors
        #[arg(short, long)]
        quiet: bool,
    },

    /// Export the filtered, sorted task table as CSV
    Export {
        /// Input file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Case-insensitive substring of the task name
        #[arg(long)]
        search: Option<String>,

        /// Exact assignee
        #[arg(long)]
        assignee: Option<String>,

        /// Exact bucket
        #[arg(long)]
        bucket: Option<String>,

        /// all, completed, in-progress, not-started
        #[arg(long, default_value = "all")]
        status: String,

        /// number, hierarchy, name, assignee, duration, start, end, percent, bucket
        #[arg(long, default_value = "hierarchy")]
        sort: String,

        /// Sort descending
        #[arg(long)]
        desc: bool,
    },

    /// Print the chart layout for one viewport as JSON
    Layout {
        /// Input file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Vertical scroll offset in pixels
        #[arg(long, default_value_t = 0.0)]
        scroll: f64,

        /// Viewport height in pixels
        #[arg(long, default_value_t = 800.0)]
        height: f64,

        /// Date marked as today (defaults to the local date)
        #[arg(long)]
        today: Option<String>,
    },
}

fn main() -> Result<process::ExitCode> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = load_config(cli.config.as_deref())?;

    let code = match cli.command {
        Commands::Check {
            file,
            format,
            strict,
            quiet,
        } => cmd_check(&file, &config, &format, DiagnosticConfig { strict, quiet })?,
        Commands::Export {
            file,
            output,
            search,
            assignee,
            bucket,
            status,
            sort,
            desc,
        } => {
            let query = TableQuery {
                search,
                assigned_to: assignee,
                bucket,
                status: status.parse()?,
                sort: sort.parse()?,
                direction: if desc { SortDirection::Desc } else { SortDirection::Asc },
            };
            cmd_export(&file, &config, &query, output.as_deref())?
        }
        Commands::Layout {
            file,
            scroll,
            height,
            today,
        } => {
            let today = match today {
                Some(text) => parse_date(&text).with_context(|| format!("Invalid date: {text}"))?,
                None => Local::now().date_naive(),
            };
            cmd_layout(&file, &config, scroll, height, today)?
        }
    };

    Ok(code.into())
}

fn load_config(path: Option<&Path>) -> Result<SchedviewConfig> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            SchedviewConfig::load(path).with_context(|| format!("Failed to load config: {}", path.display()))
        }
        None => Ok(SchedviewConfig::default()),
    }
}

fn read_rows(file: &Path, config: &SchedviewConfig) -> Result<Vec<Row>> {
    decode_file(file, &config.file).with_context(|| format!("Failed to read schedule: {}", file.display()))
}

/// Ingest or print the failure report to stderr
fn ingest_or_report(file: &Path, config: &SchedviewConfig) -> Result<Option<Ingested>> {
    let rows = read_rows(file, config)?;
    match ingest(&rows) {
        Ok(data) => {
            info!(tasks = data.tasks.len(), "ingested {}", file.display());
            Ok(Some(data))
        }
        Err(failure) => {
            let mut emitter = TerminalEmitter::new(io::stderr().lock(), DiagnosticConfig::default());
            emitter.emit_report(&failure.report);
            Ok(None)
        }
    }
}

fn cmd_check(file: &Path, config: &SchedviewConfig, format: &str, policy: DiagnosticConfig) -> Result<ExitCode> {
    let rows = read_rows(file, config)?;
    let (project, report) = match ingest(&rows) {
        Ok(data) => (Some(data.project), data.report),
        Err(failure) => (None, failure.report),
    };

    match format {
        "text" => {
            let mut out = io::stdout().lock();
            if let (Some(project), false) = (&project, policy.quiet) {
                writeln!(out, "Project: {}", project.name)?;
            }
            let mut emitter = TerminalEmitter::new(out, policy);
            emitter.emit_report(&report);
            emitter.summary(&report);
            Ok(emitter.exit_code())
        }
        "json" => {
            let mut emitter = JsonEmitter::new(policy);
            emitter.emit_report(&report);
            let value = emitter.to_json_value(project.as_ref(), &report);
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(emitter.exit_code())
        }
        other => bail!("Unknown format: {other} (expected text or json)"),
    }
}

fn cmd_export(file: &Path, config: &SchedviewConfig, query: &TableQuery, output: Option<&Path>) -> Result<ExitCode> {
    let Some(data) = ingest_or_report(file, config)? else {
        return Ok(ExitCode::Failure);
    };
    let selected = query.apply(&data.tasks);
    let summary = TableSummary::from_tasks(selected.iter().copied());
    debug!(?summary, "table selection");

    let written = match output {
        Some(path) => {
            let out = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
            write_csv(BufWriter::new(out), selected)?
        }
        None => write_csv(io::stdout().lock(), selected)?,
    };
    info!(rows = written, "export complete");
    Ok(ExitCode::Success)
}

fn cmd_layout(file: &Path, config: &SchedviewConfig, scroll: f64, height: f64, today: NaiveDate) -> Result<ExitCode> {
    let Some(data) = ingest_or_report(file, config)? else {
        return Ok(ExitCode::Failure);
    };
    let input = ViewportInput::new(scroll, height, data.tasks.len());
    let snapshot = LayoutSnapshot::build(&data, config, &input, today);
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(ExitCode::Success)
}
