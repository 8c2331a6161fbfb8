//! Console output for the command-line front end.
//!
//! Colored status lines, the pass progress bar and the per-category summary
//! table all go through [`OutputFormatter`], so the binary never formats
//! results itself. Diagnostics for individual files go to `tracing`
//! instead; this module only renders what a pass reports.

use crate::scanner::ScanReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::Path;

/// Renders status messages and scan results.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use filesorter::output::OutputFormatter;
    /// OutputFormatter::success("Monitoring stopped");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
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

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for a pass over `total` entries.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let template = "{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}";
        if let Ok(style) = ProgressStyle::default_bar().template(template) {
            pb.set_style(style.progress_chars("█▓░"));
        }
        pb
    }

    /// Prints a table of file counts by category label.
    ///
    /// ```no_run
    /// use filesorter::output::OutputFormatter;
    /// use std::collections::BTreeMap;
    ///
    /// let mut counts = BTreeMap::new();
    /// counts.insert("Documents/PDF".to_string(), 3);
    /// counts.insert("Image".to_string(), 8);
    /// OutputFormatter::summary_table(&counts, 11);
    /// ```
    pub fn summary_table(category_counts: &BTreeMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let max_category_len = category_counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(8); // At least "Category" width

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = max_category_len
        );
        println!("{}", "-".repeat(max_category_len + 10));

        for (category, count) in category_counts {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                file_word(*count),
                width = max_category_len
            );
        }

        println!("{}", "-".repeat(max_category_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            file_word(total_files),
            width = max_category_len
        );
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Prints everything a pass reported, relative to `root`.
    pub fn scan_report(report: &ScanReport, root: &Path) {
        let arrow = if report.dry_run { "would move to" } else { "→" };
        for op in &report.moved {
            Self::plain(&format!(
                " - {} {} {}",
                display_relative(&op.original_path, root),
                arrow,
                display_relative(&op.new_path, root)
            ));
        }

        for path in &report.vanished {
            Self::warning(&format!(
                "{} vanished before it could be moved",
                display_relative(path, root)
            ));
        }

        for failure in &report.failed {
            Self::error(&format!(
                "{}: {}",
                display_relative(&failure.path, root),
                failure.reason
            ));
        }

        if !report.unclassified.is_empty() {
            Self::info(&format!(
                "{} unrecognized {} left in place",
                report.unclassified.len(),
                file_word(report.unclassified.len())
            ));
        }

        if !report.moved.is_empty() {
            Self::summary_table(&report.category_counts(), report.moved.len());
        }
    }
}

fn file_word(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
