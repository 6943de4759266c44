//! Command-line interface for docrenamer.
//!
//! This module defines the command-line arguments and runs each command
//! against a [`RenameEngine`]:
//! - `scan` lists the supported documents
//! - `preview` shows (or saves) the rename plan
//! - `rename` previews, asks for confirmation and executes
//! - `apply` executes a plan saved by `preview --output`
//! - `history` lists recorded operations
//! - `revert` undoes one operation
//!
//! Per-file problems are reported in the output and do not change the exit
//! status; only structural errors (missing directory, bad configuration,
//! unknown operation) do.

use crate::config::RenamerConfig;
use crate::engine::RenameEngine;
use crate::file_kind::FileKind;
use crate::output::{OutputFormatter, plan_counts};
use crate::planner::RenamePlanEntry;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Rename office documents after their content.
#[derive(Debug, Parser)]
#[command(name = "docrenamer", version, about)]
pub struct Cli {
    /// Directory containing the documents
    pub directory: PathBuf,

    /// Configuration file (default: .docrenamerc.toml, then ~/.config/docrenamer/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Show debug diagnostics on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: RenameCommand,
}

/// A command to run against the directory.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum RenameCommand {
    /// List the supported documents in the directory
    Scan,

    /// Show the names the documents would get
    Preview {
        /// Document types to include, e.g. word,pdf (default from config)
        #[arg(short, long, value_delimiter = ',')]
        types: Vec<FileKind>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,

        /// Save the plan to a file for `apply`
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Preview, confirm and rename
    Rename {
        /// Document types to include, e.g. word,pdf (default from config)
        #[arg(short, long, value_delimiter = ',')]
        types: Vec<FileKind>,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Only show the preview
        #[arg(long)]
        dry_run: bool,
    },

    /// Execute a plan saved with `preview --output`
    Apply {
        /// Plan file
        plan_file: PathBuf,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// List recorded operations, most recent first
    History {
        /// Number of operations to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// Print the operations as JSON
        #[arg(long)]
        json: bool,
    },

    /// Undo the renames of one operation
    Revert {
        /// Operation id as shown by `history`
        #[arg(required_unless_present = "last", conflicts_with = "last")]
        operation_id: Option<String>,

        /// Revert the most recent operation
        #[arg(long)]
        last: bool,
    },
}

/// Runs a parsed command line.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use docrenamer::cli::{Cli, run};
///
/// let cli = Cli::parse_from(["docrenamer", "/path/to/documents", "preview"]);
/// if let Err(e) = run(cli) {
///     eprintln!("Error: {:#}", e);
/// }
/// ```
pub fn run(cli: Cli) -> Result<()> {
    let config =
        RenamerConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let mut engine = RenameEngine::open(&cli.directory)
        .with_context(|| format!("cannot open {}", cli.directory.display()))?;

    match cli.command {
        RenameCommand::Scan => scan(&engine, &config),
        RenameCommand::Preview {
            types,
            json,
            output,
        } => preview(&engine, &config, &types, json, output.as_deref()),
        RenameCommand::Rename {
            types,
            yes,
            dry_run,
        } => rename(&mut engine, &config, &types, yes, dry_run),
        RenameCommand::Apply { plan_file, yes } => apply(&mut engine, &plan_file, yes),
        RenameCommand::History { limit, json } => history(&engine, limit, json),
        RenameCommand::Revert { operation_id, last } => {
            revert(&mut engine, operation_id.as_deref(), last)
        }
    }
}

/// The kinds given on the command line, or the configured default.
pub fn selected_kinds(types: &[FileKind], config: &RenamerConfig) -> Vec<FileKind> {
    if types.is_empty() {
        config.rename.types.clone()
    } else {
        types.to_vec()
    }
}

fn scan(engine: &RenameEngine, config: &RenamerConfig) -> Result<()> {
    let filters = config.compile_filters()?;
    let report = engine.scan(&filters, config.scan.recursive)?;

    if report.is_empty() {
        OutputFormatter::info("No supported documents found.");
    }
    OutputFormatter::scan_table(&report);
    Ok(())
}

fn build_plan(
    engine: &RenameEngine,
    config: &RenamerConfig,
    types: &[FileKind],
) -> Result<Vec<RenamePlanEntry>> {
    let kinds = selected_kinds(types, config);
    let filters = config.compile_filters()?;
    let files = engine
        .scan(&filters, config.scan.recursive)?
        .files_for(&kinds);

    let pb = OutputFormatter::create_progress_bar(files.len() as u64, "Reading documents");
    let plan = engine.preview_with(&files, &kinds, |path| {
        if let Some(name) = path.file_name() {
            pb.set_message(name.to_string_lossy().into_owned());
        }
        pb.inc(1);
    })?;
    pb.finish_and_clear();
    Ok(plan)
}

fn preview(
    engine: &RenameEngine,
    config: &RenamerConfig,
    types: &[FileKind],
    json: bool,
    output: Option<&Path>,
) -> Result<()> {
    let plan = build_plan(engine, config, types)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else if plan.is_empty() {
        OutputFormatter::info("No documents to rename.");
    } else {
        OutputFormatter::plan_table(&plan);
    }

    if let Some(path) = output {
        let content = serde_json::to_string_pretty(&plan)?;
        fs::write(path, content)
            .with_context(|| format!("cannot write plan to {}", path.display()))?;
        OutputFormatter::success(&format!("Plan saved to {}", path.display()));
    }
    Ok(())
}

fn rename(
    engine: &mut RenameEngine,
    config: &RenamerConfig,
    types: &[FileKind],
    yes: bool,
    dry_run: bool,
) -> Result<()> {
    let plan = build_plan(engine, config, types)?;
    if plan.is_empty() {
        OutputFormatter::info("No documents to rename.");
        return Ok(());
    }
    OutputFormatter::plan_table(&plan);

    if dry_run {
        OutputFormatter::dry_run_notice("No files were renamed.");
        return Ok(());
    }
    confirm_and_execute(engine, &plan, yes)
}

fn apply(engine: &mut RenameEngine, plan_file: &Path, yes: bool) -> Result<()> {
    let content = fs::read_to_string(plan_file)
        .with_context(|| format!("cannot read plan {}", plan_file.display()))?;
    let plan: Vec<RenamePlanEntry> = serde_json::from_str(&content)
        .with_context(|| format!("invalid plan file {}", plan_file.display()))?;

    OutputFormatter::plan_table(&plan);
    confirm_and_execute(engine, &plan, yes)
}

fn confirm_and_execute(engine: &mut RenameEngine, plan: &[RenamePlanEntry], yes: bool) -> Result<()> {
    let (ready, _) = plan_counts(plan);
    if ready == 0 {
        OutputFormatter::warning("Nothing can be renamed.");
        return Ok(());
    }

    if !yes && !prompt_confirm(&format!("Rename {} file(s)?", ready), Some(false))? {
        OutputFormatter::info("Cancelled.");
        return Ok(());
    }

    let pb = OutputFormatter::create_progress_bar(plan.len() as u64, "Renaming");
    let outcome = engine.execute_with(plan, |entry| {
        pb.set_message(entry.original_name.clone());
        pb.inc(1);
    })?;
    pb.finish_and_clear();

    OutputFormatter::execution_summary(&outcome);
    Ok(())
}

fn history(engine: &RenameEngine, limit: usize, json: bool) -> Result<()> {
    let recent = engine.history().recent(limit);
    if json {
        println!("{}", serde_json::to_string_pretty(&recent)?);
    } else {
        OutputFormatter::history_table(&recent);
    }
    Ok(())
}

fn revert(engine: &mut RenameEngine, operation_id: Option<&str>, last: bool) -> Result<()> {
    let report = match operation_id {
        Some(id) if !last => engine.revert(id)?,
        _ => engine.revert_last()?,
    };
    OutputFormatter::revert_summary(&report);
    Ok(())
}

/// Asks a yes/no question on stdin until it gets an answer.
///
/// An empty answer picks `default` when there is one. End of input counts
/// as "no".
pub fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(false);
        }

        match input.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            "" => {
                if let Some(default) = default {
                    return Ok(default);
                }
            }
            _ => {}
        }
        println!("Please answer 'y' or 'n'.");
    }
}
