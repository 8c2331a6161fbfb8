//! Command-line front end for filesorter.
//!
//! This module stands in for the interactive shell a user would normally
//! drive the sorter from:
//! - Argument parsing into a [`SortCommand`] and a [`SorterConfig`]
//! - One-shot sorting, with an optional dry run
//! - Monitoring until the user asks to stop
//! - Human-readable or JSON reporting of each pass

use crate::config::{FilterRules, SorterConfig};
use crate::file_organizer::SourceRoot;
use crate::output::OutputFormatter;
use crate::scanner::{self, ScanReport};
use crate::watcher::Watcher;
use clap::{ArgAction, Parser};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Sort a directory's files into category folders by extension.
#[derive(Debug, Parser)]
#[command(name = "filesorter", version, about)]
pub struct Cli {
    /// Directory to sort
    pub directory: PathBuf,

    /// Keep watching the directory and sort files as they arrive
    #[arg(short, long)]
    pub watch: bool,

    /// With --watch, skip the pass that normally runs before monitoring starts
    #[arg(long, requires = "watch")]
    pub no_initial_scan: bool,

    /// Show where files would go without moving anything
    #[arg(long, conflicts_with = "watch")]
    pub dry_run: bool,

    /// Print each pass report as JSON, including passes run while watching
    #[arg(long)]
    pub json: bool,

    /// Quiet period after the last change before a pass runs
    #[arg(long, value_name = "MS", default_value_t = 1_000)]
    pub debounce_ms: u64,

    /// Longest a stream of changes may postpone a pass
    #[arg(long, value_name = "MS", default_value_t = 10_000)]
    pub max_debounce_ms: u64,

    /// Leave hidden files (names starting with '.') alone
    #[arg(long)]
    pub skip_hidden: bool,

    /// Leave files matching this glob alone
    #[arg(long = "exclude", value_name = "GLOB")]
    pub exclude_patterns: Vec<String>,

    /// Leave files with this extension alone
    #[arg(long = "exclude-ext", value_name = "EXT")]
    pub exclude_extensions: Vec<String>,

    /// Leave files with exactly this name alone
    #[arg(long = "exclude-name", value_name = "NAME")]
    pub exclude_filenames: Vec<String>,

    /// Leave files whose name matches this regex alone
    #[arg(long = "exclude-regex", value_name = "REGEX")]
    pub exclude_regex: Vec<String>,

    /// Always sort files matching this glob, even if excluded
    #[arg(long = "include", value_name = "GLOB")]
    pub include_patterns: Vec<String>,

    /// More diagnostic output (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Less diagnostic output (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    /// The command selected by the flags.
    pub fn sort_command(&self) -> SortCommand {
        if self.watch {
            SortCommand::Watch {
                initial_scan: !self.no_initial_scan,
            }
        } else {
            SortCommand::Scan {
                dry_run: self.dry_run,
            }
        }
    }

    /// Session settings assembled from the flags.
    pub fn sorter_config(&self) -> SorterConfig {
        SorterConfig::default()
            .with_debounce(Duration::from_millis(self.debounce_ms))
            .with_max_debounce(Duration::from_millis(self.max_debounce_ms))
            .with_filters(FilterRules {
                include_hidden: !self.skip_hidden,
                exclude_filenames: self.exclude_filenames.clone(),
                exclude_extensions: self.exclude_extensions.clone(),
                exclude_patterns: self.exclude_patterns.clone(),
                exclude_regex: self.exclude_regex.clone(),
                include_patterns: self.include_patterns.clone(),
            })
    }
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortCommand {
    /// Sort the directory once.
    Scan {
        /// If true, report planned moves without making changes.
        dry_run: bool,
    },
    /// Sort as files arrive until stopped.
    Watch {
        /// Run one pass before monitoring starts.
        initial_scan: bool,
    },
}

/// Runs the parsed command line, stopping a watch when Enter is pressed.
pub fn run(cli: &Cli) -> Result<(), String> {
    run_cli(
        cli.sort_command(),
        &cli.directory,
        cli.sorter_config(),
        cli.json,
        wait_for_enter,
    )
}

/// Runs a command against a directory.
///
/// `until_stopped` is called once monitoring is active and should return
/// when monitoring should end; it is ignored for one-shot commands.
///
/// # Examples
///
/// ```no_run
/// use filesorter::cli::{run_cli, SortCommand};
/// use filesorter::config::SorterConfig;
/// use std::path::Path;
///
/// let result = run_cli(
///     SortCommand::Scan { dry_run: false },
///     Path::new("/path/to/directory"),
///     SorterConfig::default(),
///     false,
///     || {},
/// );
/// if let Err(e) = result {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli<S>(
    command: SortCommand,
    dir_path: &Path,
    config: SorterConfig,
    json: bool,
    until_stopped: S,
) -> Result<(), String>
where
    S: FnOnce(),
{
    match command {
        SortCommand::Scan { dry_run: true } => sort_directory_dry_run(dir_path, &config, json),
        SortCommand::Scan { dry_run: false } => sort_directory(dir_path, config, json),
        SortCommand::Watch { initial_scan } => {
            watch_directory(dir_path, config, initial_scan, json, until_stopped)
        }
    }
}

/// Sorts the directory once, with a progress bar unless printing JSON.
fn sort_directory(dir_path: &Path, config: SorterConfig, json: bool) -> Result<(), String> {
    let watcher = Watcher::new(dir_path, config).map_err(|e| e.to_string())?;
    if !json {
        OutputFormatter::info(&format!("Sorting contents of: {}", dir_path.display()));
    }
    let report = run_pass(&watcher, json)?;
    print_report(&report, dir_path, json)
}

/// Reports where files would go without creating or moving anything.
fn sort_directory_dry_run(
    dir_path: &Path,
    config: &SorterConfig,
    json: bool,
) -> Result<(), String> {
    config.validate().map_err(|e| e.to_string())?;
    let filters = config
        .filters
        .clone()
        .compile()
        .map_err(|e| format!("Error compiling filters: {}", e))?;
    let root = SourceRoot::open_existing(dir_path).map_err(|e| e.to_string())?;

    let report = scanner::preview(&root, &filters).map_err(|e| e.to_string())?;
    if json {
        return print_report(&report, dir_path, true);
    }

    OutputFormatter::dry_run_notice(&format!("Analyzing contents of: {}", dir_path.display()));
    if report.moved.is_empty() {
        OutputFormatter::plain("No files to sort.");
        return Ok(());
    }
    print_report(&report, dir_path, false)?;
    OutputFormatter::dry_run_notice("No files were moved.");
    Ok(())
}

/// Monitors the directory until `until_stopped` returns.
fn watch_directory<S>(
    dir_path: &Path,
    config: SorterConfig,
    initial_scan: bool,
    json: bool,
    until_stopped: S,
) -> Result<(), String>
where
    S: FnOnce(),
{
    let watcher = Watcher::new(dir_path, config).map_err(|e| e.to_string())?;

    if initial_scan {
        let report = run_pass(&watcher, json)?;
        print_report(&report, dir_path, json)?;
    }

    let root_path = watcher.root().path().to_path_buf();
    watcher
        .start_monitoring_with(move |report| {
            if report.is_noop() {
                return;
            }
            if let Err(e) = print_report(report, &root_path, json) {
                OutputFormatter::error(&e);
            }
        })
        .map_err(|e| e.to_string())?;
    if !json {
        OutputFormatter::info(&format!(
            "Monitoring {}. Press Enter to stop.",
            watcher.root().path().display()
        ));
    }

    until_stopped();

    watcher.stop_monitoring().map_err(|e| e.to_string())?;
    if !json {
        OutputFormatter::success("Monitoring stopped.");
    }
    Ok(())
}

fn run_pass(watcher: &Watcher, json: bool) -> Result<ScanReport, String> {
    if json {
        return watcher.scan_once().map_err(|e| e.to_string());
    }

    let pb = OutputFormatter::create_progress_bar(0);
    let report = watcher
        .scan_with_progress(|progress| {
            pb.set_length(progress.total as u64);
            pb.set_position(progress.processed as u64);
        })
        .map_err(|e| e.to_string())?;
    pb.finish_and_clear();
    Ok(report)
}

fn print_report(report: &ScanReport, dir_path: &Path, json: bool) -> Result<(), String> {
    if json {
        let rendered = serde_json::to_string_pretty(report)
            .map_err(|e| format!("Error serializing report: {}", e))?;
        OutputFormatter::plain(&rendered);
        return Ok(());
    }

    OutputFormatter::scan_report(report, dir_path);
    if report.is_noop() && !report.dry_run {
        OutputFormatter::plain("Nothing to sort.");
    } else if !report.failed.is_empty() {
        OutputFormatter::warning("Some files could not be moved. Please review errors above.");
    }
    Ok(())
}

/// Blocks until a line (or end of input) arrives on stdin.
fn wait_for_enter() {
    let mut line = String::new();
    let _ = io::stdin().read_line(&mut line);
}
