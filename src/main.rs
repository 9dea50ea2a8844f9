//! dupsweep - audit a directory tree and sweep away duplicate files.
//!
//! Usage:
//!   dupsweep [PATH]              Count, find duplicates, remove them, report
//!   dupsweep [PATH] --dry-run    Same report, nothing is deleted
//!   dupsweep                     Prompt for the root directory
//!   dupsweep --help              Show help

mod report;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;

use clap::{ArgAction, Parser, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use dupsweep_analyze::{DuplicateConfig, DuplicateFinder};
use dupsweep_ops::{DuplicateRemover, RemoveOptions};
use dupsweep_scan::{DirectorySizer, ScanConfig, TreeScanner};

use crate::report::SweepReport;

#[derive(Parser)]
#[command(
    name = "dupsweep",
    version,
    about = "Count files by type, then find and remove duplicate copies",
    long_about = "dupsweep walks a directory tree, counts files per extension, \
                  finds files with identical contents and removes every copy \
                  but one. Hard links are never treated as duplicates."
)]
struct Cli {
    /// Root directory to sweep (prompted for when omitted)
    path: Option<PathBuf>,

    /// Worker threads for the walk (0 = one per core, 1 = serial)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,

    /// Skip hidden files and directories
    #[arg(long = "no-hidden", action = ArgAction::SetFalse)]
    hidden: bool,

    /// Glob for entry names to skip (repeatable)
    #[arg(short, long = "ignore", value_name = "GLOB")]
    ignore: Vec<String>,

    /// Smallest file size considered for duplicates (e.g. "0", "1KB", "4M")
    #[arg(short, long, default_value = "1")]
    min_size: String,

    /// Report what would be removed without deleting anything
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let root = match cli.path.clone() {
        Some(path) => path,
        None => prompt_for_root()?,
    };

    let config = ScanConfig::builder()
        .root(root)
        .threads(cli.threads)
        .include_hidden(cli.hidden)
        .ignore_patterns(cli.ignore.clone())
        .build()
        .context("Invalid scan configuration")?;

    let report = run_sweep(&cli, config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.format {
        OutputFormat::Text => report.write_text(&mut out)?,
        OutputFormat::Json => report.write_json(&mut out)?,
    }
    out.flush()?;

    Ok(())
}

/// Scan, detect, measure, remove, measure again.
fn run_sweep(cli: &Cli, config: ScanConfig) -> Result<SweepReport> {
    let scanner = TreeScanner::new();
    let progress_logger = spawn_progress_logger(&scanner);
    let scanned = scanner.scan(&config);
    drop(scanner);
    if let Some(message) = join_logger(progress_logger) {
        debug!(%message, "progress logger thread panicked");
    }
    let session = scanned.context("Scan failed")?;

    let dup_config = DuplicateConfig::builder()
        .min_size(parse_size(&cli.min_size)?)
        .build()
        .context("Invalid duplicate configuration")?;
    let duplicates = DuplicateFinder::with_config(dup_config).find_duplicates(&session.catalog);

    let sizer = DirectorySizer::new(config);
    let size_before = sizer.total_size().context("Failed to measure size before removal")?;

    let remover = DuplicateRemover::with_options(RemoveOptions {
        dry_run: cli.dry_run,
    });
    let outcome = remover.remove_duplicates(&duplicates.groups);

    let size_after = sizer.total_size().context("Failed to measure size after removal")?;
    info!(size_before, size_after, bytes_freed = outcome.bytes_freed, "sweep finished");

    Ok(SweepReport::new(
        &session,
        &duplicates,
        &outcome,
        size_before,
        size_after,
    ))
}

/// Log scan progress until the scanner goes away.
fn spawn_progress_logger(scanner: &TreeScanner) -> thread::JoinHandle<()> {
    let mut rx = scanner.subscribe();
    thread::spawn(move || {
        loop {
            match rx.blocking_recv() {
                Ok(progress) => debug!(
                    files = progress.files_scanned,
                    dirs = progress.dirs_scanned,
                    bytes = progress.bytes_scanned,
                    rate = progress.files_per_second() as u64,
                    current = %progress.current_path.display(),
                    "scanning"
                ),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Wait for the logger thread; returns its panic message if it panicked.
fn join_logger(handle: thread::JoinHandle<()>) -> Option<String> {
    let payload = handle.join().err()?;
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    Some(message)
}

/// Ask the operator for the root directory on stdin.
fn prompt_for_root() -> Result<PathBuf> {
    print!("Enter the root directory path: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read root directory")?;

    let trimmed = line.trim();
    if trimmed.is_empty() {
        bail!("No root directory given");
    }
    Ok(PathBuf::from(trimmed))
}

/// Install the stderr subscriber; `RUST_LOG` overrides the flags.
fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Parse a size string (e.g., "1KB", "10MB", "1GB").
fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();
    let digits = s.trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.');
    let suffix = s[digits.len()..].trim();

    let multiplier: u64 = match suffix {
        "" | "B" => 1,
        "K" | "KB" | "KIB" => 1024,
        "M" | "MB" | "MIB" => 1024 * 1024,
        "G" | "GB" | "GIB" => 1024 * 1024 * 1024,
        other => bail!("Unknown size suffix: {other}"),
    };
    let num: f64 = digits
        .parse()
        .with_context(|| format!("Invalid size: {s}"))?;

    Ok((num * multiplier as f64) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_logger_reports_panic_message() {
        assert_eq!(join_logger(thread::spawn(|| {})), None);

        let handle: thread::JoinHandle<()> = thread::spawn(|| panic!("receiver gone"));
        assert_eq!(join_logger(handle).as_deref(), Some("receiver gone"));

        let handle: thread::JoinHandle<()> = thread::spawn(|| panic!("{} files", 3));
        assert_eq!(join_logger(handle).as_deref(), Some("3 files"));
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("0").unwrap(), 0);
        assert_eq!(parse_size("1").unwrap(), 1);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("1.5k").unwrap(), 1536);
        assert_eq!(parse_size("4M").unwrap(), 4 * 1024 * 1024);
        assert_eq!(parse_size("2 GiB").unwrap(), 2 * 1024 * 1024 * 1024);
        assert!(parse_size("12parsecs").is_err());
        assert!(parse_size("KB").is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["dupsweep", "/tmp"]);
        assert_eq!(cli.path, Some(PathBuf::from("/tmp")));
        assert!(cli.hidden);
        assert!(!cli.dry_run);
        assert_eq!(cli.threads, 0);

        let cli = Cli::parse_from(["dupsweep", "--no-hidden", "-n", "-i", "*.bak", "-i", "target"]);
        assert_eq!(cli.path, None);
        assert!(!cli.hidden);
        assert!(cli.dry_run);
        assert_eq!(cli.ignore, vec!["*.bak", "target"]);
    }

    #[test]
    fn test_sweep_end_to_end() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir(root.join("sub")).unwrap();
        std::fs::write(root.join("a.txt"), "hi").unwrap();
        std::fs::write(root.join("sub/b.txt"), "hi").unwrap();
        std::fs::write(root.join("c.log"), "bye").unwrap();

        let cli = Cli::parse_from(["dupsweep"]);
        let report = run_sweep(&cli, ScanConfig::new(root)).unwrap();

        assert_eq!(report.total_files, 3);
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.size_before - report.size_after, 2);
        assert_eq!(report.density.len(), 1);
        assert_eq!(report.density[0].duplicates, 1);
        assert!(root.join("a.txt").exists());
        assert!(!root.join("sub/b.txt").exists());
    }
}
