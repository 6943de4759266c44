//! Output formatting and styling module.
//!
//! All user-facing terminal output goes through [`OutputFormatter`]: colored
//! status lines, progress bars, and the tables for scans, plans, executed
//! operations, history and reverts. Diagnostics go through `tracing`
//! instead.

use crate::executor::ExecuteOutcome;
use crate::file_kind::FileKind;
use crate::history::OperationRecord;
use crate::naming::truncate_for_display;
use crate::planner::{PlanOutcome, RenamePlanEntry};
use crate::revert::RevertReport;
use crate::scanner::ScanReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Widest file name shown in tables before it is shortened.
const NAME_COLUMN_CHARS: usize = 40;

/// Manages all CLI output with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use docrenamer::output::OutputFormatter;
    /// OutputFormatter::success("3 files renamed");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark, on stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for `total` items.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use docrenamer::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(10, "Reading");
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb.set_message(message.to_string());
        pb
    }

    /// Prints the supported files of a scan grouped by kind.
    pub fn scan_table(report: &ScanReport) {
        Self::header(&format!("FILES IN {}", report.base_dir.display()));

        let width = FileKind::SUPPORTED
            .iter()
            .map(|kind| kind.friendly_name().len())
            .max()
            .unwrap_or(0);

        println!("{:<width$}   | {}", "Type".bold(), "Files".bold(), width = width);
        println!("{}", "-".repeat(width + 20));
        for (kind, group) in &report.groups {
            let extensions: Vec<_> = group.extensions.iter().map(|e| format!(".{}", e)).collect();
            println!(
                "{} {:<width$} | {} ({})",
                kind.icon(),
                kind.friendly_name(),
                group.files.len().to_string().green(),
                extensions.join(", "),
                width = width
            );
        }
        println!("{}", "-".repeat(width + 20));
        println!(
            "{}: {}  {}: {}  {}: {}",
            "Total".bold(),
            report.total_files,
            "Supported".bold(),
            report.supported_files.to_string().green(),
            "Other".bold(),
            report.unsupported_files
        );
    }

    /// Prints a rename plan, one block per file.
    pub fn plan_table(plan: &[RenamePlanEntry]) {
        Self::header("RENAME PREVIEW");

        for entry in plan {
            let original = truncate_for_display(&entry.original_name, NAME_COLUMN_CHARS);
            match &entry.outcome {
                PlanOutcome::Ready {
                    new_name,
                    title_extracted,
                    ..
                } => {
                    println!("{} {} {} {}", "✓".green(), original, "→".cyan(), new_name.green());
                    if !title_extracted.is_empty() {
                        println!("    {} {}", "title:".dimmed(), title_extracted);
                    }
                }
                PlanOutcome::Error { error } => {
                    println!("{} {} {}", "✗".red(), original, error.red());
                }
            }
        }

        let (ready, errors) = plan_counts(plan);
        println!(
            "\n{} ready, {} with errors",
            ready.to_string().green().bold(),
            errors.to_string().red().bold()
        );
    }

    /// Prints the result of an execute call.
    pub fn execution_summary(outcome: &ExecuteOutcome) {
        let op = &outcome.operation;
        Self::header("RESULT");

        if op.failed_count == 0 {
            Self::success(&format!("{} renamed", plural(op.successful_count, "file")));
        } else {
            Self::warning(&format!(
                "{} renamed, {} failed",
                plural(op.successful_count, "file"),
                op.failed_count
            ));
            for failure in &op.failed_renames {
                println!("    - {}: {}", failure.file, failure.error.red());
            }
        }

        if let Some(warning) = &outcome.history_warning {
            Self::warning(&format!("history not saved: {}", warning));
        }
        println!("Operation id: {}", op.operation_id.bold());
    }

    /// Prints recorded operations, most recent first.
    pub fn history_table(operations: &[&OperationRecord]) {
        Self::header("HISTORY");

        if operations.is_empty() {
            Self::info("No operations recorded.");
            return;
        }

        println!(
            "{:<26} | {:<19} | {:>7} | {:>6}",
            "Operation".bold(),
            "Date".bold(),
            "Renamed".bold(),
            "Failed".bold()
        );
        println!("{}", "-".repeat(68));
        for op in operations {
            println!(
                "{:<26} | {:<19} | {:>7} | {:>6}",
                op.operation_id,
                op.timestamp.format("%Y-%m-%d %H:%M:%S"),
                op.successful_count.to_string().green(),
                if op.failed_count > 0 {
                    op.failed_count.to_string().red()
                } else {
                    op.failed_count.to_string().normal()
                }
            );
        }
    }

    /// Prints the result of a revert.
    pub fn revert_summary(report: &RevertReport) {
        Self::header(&format!("REVERT {}", report.operation_id));

        let message = format!(
            "{} of {} restored",
            report.reverted_count, report.total_to_revert
        );
        if report.is_complete_success() {
            Self::success(&message);
        } else {
            Self::warning(&message);
            for failure in &report.failed_reverts {
                println!("    - {}: {}", failure.file, failure.error.red());
            }
        }
    }
}

/// Number of ready and errored entries in a plan.
pub fn plan_counts(plan: &[RenamePlanEntry]) -> (usize, usize) {
    let ready = plan.iter().filter(|entry| entry.is_ready()).count();
    (ready, plan.len() - ready)
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}
