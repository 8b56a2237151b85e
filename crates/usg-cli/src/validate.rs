//! # Validate Subcommand
//!
//! Runs the full registry pipeline and renders its outcome:
//!
//! - one line per rejected or flagged record on stderr, as it happens;
//! - a per-collection tally on stdout;
//! - a final `PASS` or `FAIL` line.
//!
//! Returns exit code 0 when every record passed and 1 otherwise. Fatal
//! errors propagate to `main`.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use usg_core::Timestamp;
use usg_registry::{run, Diagnostic, DiagnosticSink, PipelineOptions, RunReport};
use usg_schema::DEFAULT_EVENT_SCHEMA_VERSION;

use crate::config::ValidatorConfig;
use crate::{resolve_path, under_root};

/// Environment variable honoured for reproducible `generated_at` values.
pub const SOURCE_DATE_EPOCH: &str = "SOURCE_DATE_EPOCH";

/// Arguments for `usg validate`.
#[derive(Args, Debug, Default)]
pub struct ValidateArgs {
    /// Event schema version tag (selects `event-schema.v<VERSION>.json`).
    #[arg(long = "schema-version", value_name = "VERSION")]
    pub schema_version: Option<String>,

    /// Pin the `generated_at` timestamp (`YYYY-MM-DDTHH:MM:SSZ`).
    #[arg(long, value_name = "TIMESTAMP")]
    pub generated_at: Option<String>,

    /// Write index documents here instead of `registry/_index`. Relative
    /// paths are taken from the repository root.
    #[arg(long, value_name = "DIR")]
    pub index_dir: Option<std::path::PathBuf>,
}

/// Writes each diagnostic as one line the moment it is reported.
#[derive(Debug)]
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl ConsoleSink<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> DiagnosticSink for ConsoleSink<W> {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        // A closed stderr must not abort the run.
        let _ = writeln!(self.out, "{diagnostic}");
    }
}

/// Execute `usg validate`.
pub fn run_validate(args: &ValidateArgs, config: Option<&Path>, repo_root: &Path) -> Result<u8> {
    let config = match config {
        Some(path) => ValidatorConfig::load(&resolve_path(path, repo_root))?,
        None => ValidatorConfig::default(),
    };

    let mut layout = config.layout(repo_root);
    if let Some(dir) = &args.index_dir {
        layout.index_dir = under_root(dir, repo_root);
    }

    let event_schema_version = args
        .schema_version
        .clone()
        .or(config.event_schema_version)
        .unwrap_or_else(|| DEFAULT_EVENT_SCHEMA_VERSION.to_string());

    let epoch = std::env::var(SOURCE_DATE_EPOCH).ok();
    let generated_at = resolve_generated_at(args.generated_at.as_deref(), epoch.as_deref())?;

    tracing::debug!(
        registry_dir = %layout.registry_dir.display(),
        schema_dir = %layout.schema_dir.display(),
        index_dir = %layout.index_dir.display(),
        event_schema_version = %event_schema_version,
        generated_at = %generated_at,
        "starting registry validation"
    );

    let options = PipelineOptions {
        layout,
        event_schema_version,
        generated_at,
    };
    let mut sink = ConsoleSink::stderr();
    let report = run(&options, &mut sink).context("registry validation aborted")?;

    print!("{}", render_summary(&report));
    Ok(if report.passed() { 0 } else { 1 })
}

/// Pick the `generated_at` value: explicit flag, then `SOURCE_DATE_EPOCH`,
/// then the current time.
pub fn resolve_generated_at(flag: Option<&str>, source_date_epoch: Option<&str>) -> Result<Timestamp> {
    if let Some(ts) = flag {
        return Timestamp::parse(ts).with_context(|| format!("invalid --generated-at value {ts:?}"));
    }
    if let Some(raw) = source_date_epoch.map(str::trim).filter(|s| !s.is_empty()) {
        let secs: i64 = raw
            .parse()
            .with_context(|| format!("{SOURCE_DATE_EPOCH} is not an integer: {raw:?}"))?;
        return Timestamp::from_epoch_secs(secs)
            .with_context(|| format!("{SOURCE_DATE_EPOCH} out of range: {secs}"));
    }
    Ok(Timestamp::now())
}

/// The closing tally and verdict.
pub fn render_summary(report: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Registry summary (generated_at {}):", report.generated_at);
    for tally in &report.tallies {
        let _ = writeln!(
            out,
            "  {:<16} files: {:>5}  valid: {:>5}",
            tally.kind.dir_name(),
            tally.files,
            tally.valid
        );
    }
    let _ = writeln!(out);
    if report.passed() {
        let _ = writeln!(
            out,
            "PASS: registry valid, {} index documents written",
            report.indexes.len()
        );
    } else {
        let _ = writeln!(
            out,
            "FAIL: {} error(s) (loader: {}, references: {}, events: {})",
            report.total_errors(),
            report.loader_errors,
            report.reference_errors,
            report.event_errors
        );
    }
    out
}
