//! dupefind - File Finder and Duplicate Detector
//!
//! Walks directory trees, selects files by size, extension, name and date,
//! and groups byte-identical files by size and MD5 content digest. Results
//! stream out through callbacks while the scan runs, with throttled progress
//! and cooperative cancellation.
//!
//! The engine lives in [`scanner`], [`duplicates`] and [`session`]; the rest
//! backs the `dupefind` binary.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod session;
pub mod signal;

use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::Path;

use anyhow::Context;

use crate::cli::{Cli, Commands, FilterArgs};
use crate::config::Settings;
use crate::duplicates::UnreadablePolicy;
use crate::error::ExitCode;
use crate::output::{writer_for, OutputError, OutputFormat, ResultRow, ResultWriter};
use crate::progress::ProgressDisplay;
use crate::scanner::FilterConfig;
use crate::session::{ScanMode, ScanSession, ScanState, ScanSummary};
use crate::signal::CancelToken;

/// Run the application for parsed arguments.
///
/// # Errors
///
/// Returns an error if settings cannot be loaded, the output cannot be
/// opened or written, or the session refuses to start.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    log::debug!("dupefind v{} starting", env!("CARGO_PKG_VERSION"));

    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    let (mode, filter_args, output_args) = match cli.command {
        Commands::Search(args) => (ScanMode::Search, args.filter, args.output),
        Commands::Duplicates(args) => {
            if let Some(threads) = args.hash_threads {
                settings.hash_threads = threads.max(1);
            }
            if args.exclude_unreadable {
                settings.unreadable = UnreadablePolicy::Exclude;
            }
            (ScanMode::Duplicates, args.filter, args.output)
        }
    };

    let filter = filter_args.apply(settings.filter.clone()).normalized();
    let format = output_args.output.unwrap_or(settings.output);
    log::debug!("Filter: {filter:?}");

    let cancel = CancelToken::new();
    if let Err(e) = signal::install_handler(&cancel) {
        log::debug!("Continuing without a Ctrl+C handler: {e}");
    }

    let session = ScanSession::with_cancel_token(settings.session_config(), cancel);
    let out = open_output(output_args.output_file.as_deref())?;
    let mut writer = writer_for(format, out);

    let hide_progress = cli.quiet || output_args.no_progress || !io::stderr().is_terminal();
    let label = match mode {
        ScanMode::Search => "Searching",
        ScanMode::Duplicates => "Finding duplicates",
    };
    let display = ProgressDisplay::new(label, hide_progress);

    let summary = run_scan(
        &session,
        mode,
        &filter_args,
        &filter,
        writer.as_mut(),
        &display,
    )?;

    writer.finish().context("Failed to flush results")?;

    match summary.state {
        ScanState::Cancelled => display.abandon("cancelled"),
        _ => display.finish("done"),
    }
    if !cli.quiet {
        report_summary(&summary, format, output_args.output_file.as_deref());
    }

    Ok(exit_code_for(&summary))
}

/// Run one scan, streaming rows into `writer`.
///
/// The first write failure cancels the scan and is returned once it stops.
/// An interrupt that arrived before the scan could start is honored here,
/// since starting a session clears its token.
fn run_scan(
    session: &ScanSession,
    mode: ScanMode,
    filter_args: &FilterArgs,
    filter: &FilterConfig,
    writer: &mut (dyn ResultWriter + Send),
    display: &ProgressDisplay,
) -> anyhow::Result<ScanSummary> {
    let cancel = session.cancel_token();
    if cancel.is_cancelled() {
        log::info!("Interrupted before the scan started");
        let mut summary = ScanSummary::new(mode);
        summary.state = ScanState::Cancelled;
        return Ok(summary);
    }

    let mut write_error: Option<OutputError> = None;
    let mut write = |row: ResultRow| {
        if write_error.is_some() {
            return;
        }
        if let Err(e) = writer.write_row(&row) {
            log::error!("Stopping scan: {e}");
            write_error = Some(e);
            cancel.cancel();
        }
    };
    let roots = filter_args.roots.iter().cloned();

    let summary = match mode {
        ScanMode::Search => session.search(
            roots,
            filter,
            |record| write(ResultRow::from_record(&record, None)),
            |pct| display.set(pct),
        ),
        ScanMode::Duplicates => session.search_duplicates(
            roots,
            filter,
            |record, group_id| write(ResultRow::from_record(&record, Some(group_id))),
            |pct| display.set(pct),
        ),
    }
    .context("Failed to start scan")?;

    if let Some(e) = write_error {
        return Err(e).context("Failed to write results");
    }
    Ok(summary)
}

fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write + Send>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            log::debug!("Writing results to {}", path.display());
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}

fn report_summary(summary: &ScanSummary, format: OutputFormat, output_file: Option<&Path>) {
    let mut line = match summary.mode {
        ScanMode::Search => format!(
            "{} of {} files matched",
            summary.matched, summary.candidates
        ),
        ScanMode::Duplicates => format!(
            "{} duplicate groups, {} files, {} reclaimable",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display()
        ),
    };
    if summary.error_count() > 0 {
        line.push_str(&format!(", {} unreadable", summary.error_count()));
    }
    if summary.is_cancelled() {
        line.push_str(" (cancelled)");
    }
    line.push_str(&format!(" in {:.2?}", summary.duration));
    if let Some(path) = output_file {
        line.push_str(&format!("; {format} written to {}", path.display()));
    }
    eprintln!("{line}");
}

/// Exit code for a finished scan.
#[must_use]
pub fn exit_code_for(summary: &ScanSummary) -> ExitCode {
    if summary.is_cancelled() {
        ExitCode::Interrupted
    } else if summary.has_results() {
        ExitCode::Success
    } else {
        ExitCode::NoMatches
    }
}
