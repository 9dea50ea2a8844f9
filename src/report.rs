//! Final sweep report, rendered as text or JSON.

use std::io::{self, Write};
use std::path::PathBuf;

use serde::Serialize;

use dupsweep_analyze::{DirectoryDensity, DuplicateReport, duplicate_density};
use dupsweep_core::{ScanSession, ScanStats, ScanWarning};
use dupsweep_ops::{RemovalOutcome, RemovedFile};

/// Count of files sharing one extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionCount {
    pub extension: String,
    pub count: u64,
}

/// A duplicate that stayed on disk.
#[derive(Debug, Clone, Serialize)]
pub struct FailureLine {
    pub path: PathBuf,
    pub kind: &'static str,
    pub message: String,
}

/// Everything a sweep found and did, in printing order.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub root: PathBuf,
    pub total_files: u64,
    pub extensions: Vec<ExtensionCount>,
    pub duplicate_groups: usize,
    pub dry_run: bool,
    pub removed: Vec<RemovedFile>,
    pub size_before: u64,
    pub size_after: u64,
    pub bytes_freed: u64,
    pub density: Vec<DirectoryDensity>,
    pub failures: Vec<FailureLine>,
    pub warnings: Vec<ScanWarning>,
    pub stats: ScanStats,
    pub hardlinks_excluded: u64,
}

impl SweepReport {
    /// Assemble the report from the results of each pipeline stage.
    pub fn new(
        session: &ScanSession,
        duplicates: &DuplicateReport<'_>,
        outcome: &RemovalOutcome,
        size_before: u64,
        size_after: u64,
    ) -> Self {
        let extensions = session
            .registry
            .snapshot()
            .into_iter()
            .map(|(extension, count)| ExtensionCount { extension, count })
            .collect();

        let density = duplicate_density(
            &session.root,
            duplicates.redundant_files().map(|r| r.path.as_path()),
        );

        let failures = outcome
            .failures
            .iter()
            .map(|f| FailureLine {
                path: f.path.clone(),
                kind: f.error.kind(),
                message: f.error.to_string(),
            })
            .collect();

        let mut warnings = session.warnings.clone();
        warnings.extend(duplicates.warnings.iter().cloned());

        Self {
            root: session.root.clone(),
            total_files: session.total_files(),
            extensions,
            duplicate_groups: duplicates.group_count,
            dry_run: outcome.dry_run,
            removed: outcome.removed.clone(),
            size_before,
            size_after,
            bytes_freed: outcome.bytes_freed,
            density,
            failures,
            warnings,
            stats: session.stats.clone(),
            hardlinks_excluded: duplicates.hardlinks_excluded,
        }
    }

    /// Print the plain-text report.
    pub fn write_text(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "Total number of files: {}", self.total_files)?;
        writeln!(out, "Number of each file type:")?;
        for ext in &self.extensions {
            writeln!(out, ".{}: {}", ext.extension, ext.count)?;
        }

        if self.dry_run {
            writeln!(out, "Duplicate files that would be removed: {}", self.removed.len())?;
        } else {
            writeln!(out, "Duplicate files found & removed: {}", self.removed.len())?;
        }
        for file in &self.removed {
            writeln!(out, "{}", file.path.display())?;
        }

        writeln!(out, "Size before removal: {} KiB", self.size_before / 1024)?;
        writeln!(out, "Size after removal: {} KiB", self.size_after / 1024)?;
        writeln!(out, "Reclaimed: {}", format_size(self.bytes_freed))?;

        if !self.density.is_empty() {
            writeln!(out, "Directory: {}", self.root.display())?;
            for dir in &self.density {
                writeln!(out, "{} duplicate(s) found in {}", dir.duplicates, dir.path.display())?;
            }
        }

        if !self.failures.is_empty() {
            writeln!(out)?;
            writeln!(out, "{} file(s) could not be removed:", self.failures.len())?;
            for failure in &self.failures {
                writeln!(out, "  {}", failure.message)?;
            }
        }

        if !self.warnings.is_empty() {
            writeln!(out)?;
            writeln!(out, "{} warning(s):", self.warnings.len())?;
            for warning in &self.warnings {
                writeln!(out, "  {}: {}", warning.path.display(), warning.message)?;
            }
        }

        Ok(())
    }

    /// Print the report as pretty JSON.
    pub fn write_json(&self, out: &mut impl Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out)
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SweepReport {
        SweepReport {
            root: PathBuf::from("/r"),
            total_files: 4,
            extensions: vec![
                ExtensionCount { extension: "txt".into(), count: 2 },
                ExtensionCount { extension: "log".into(), count: 1 },
                ExtensionCount { extension: String::new(), count: 1 },
            ],
            duplicate_groups: 1,
            dry_run: false,
            removed: vec![RemovedFile { path: PathBuf::from("/r/sub/b.txt"), size: 2048 }],
            size_before: 5120,
            size_after: 3072,
            bytes_freed: 2048,
            density: vec![DirectoryDensity { path: PathBuf::from("/r/sub"), duplicates: 1 }],
            failures: Vec::new(),
            warnings: Vec::new(),
            stats: ScanStats::default(),
            hardlinks_excluded: 0,
        }
    }

    fn render(report: &SweepReport) -> String {
        let mut buf = Vec::new();
        report.write_text(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_text_sections_in_order() {
        let text = render(&sample());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines,
            vec![
                "Total number of files: 4",
                "Number of each file type:",
                ".txt: 2",
                ".log: 1",
                ".: 1",
                "Duplicate files found & removed: 1",
                "/r/sub/b.txt",
                "Size before removal: 5 KiB",
                "Size after removal: 3 KiB",
                "Reclaimed: 2 KiB",
                "Directory: /r",
                "1 duplicate(s) found in /r/sub",
            ]
        );
    }

    #[test]
    fn test_dry_run_wording() {
        let mut report = sample();
        report.dry_run = true;
        assert!(render(&report).contains("Duplicate files that would be removed: 1"));
    }

    #[test]
    fn test_failures_and_warnings_follow_report() {
        let mut report = sample();
        report.failures.push(FailureLine {
            path: PathBuf::from("/r/c"),
            kind: "modified",
            message: "file modified since scan: /r/c".into(),
        });
        report.warnings.push(ScanWarning::directory_unreadable("/r/locked", "permission denied"));

        let text = render(&report);
        let failures_at = text.find("1 file(s) could not be removed:").unwrap();
        let warnings_at = text.find("1 warning(s):").unwrap();
        assert!(failures_at > text.find("Size after removal").unwrap());
        assert!(warnings_at > failures_at);
        assert!(text.contains("  /r/locked: "));
    }

    #[test]
    fn test_json_output() {
        let mut buf = Vec::new();
        sample().write_json(&mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["total_files"], 4);
        assert_eq!(value["extensions"][0]["extension"], "txt");
        assert_eq!(value["removed"][0]["size"], 2048);
        assert_eq!(value["density"][0]["duplicates"], 1);
    }
}
