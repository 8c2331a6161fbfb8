//! One pass over the source root.
//!
//! A pass lists the direct entries of the root (never descending into the
//! category folders), skips anything that is not a regular file or that the
//! filters reject, classifies the rest and hands them to the placer. Every
//! per-file problem is folded into the returned [`ScanReport`]; only an
//! unreadable root fails the pass as a whole.

use crate::config::CompiledFilters;
use crate::file_category::{Category, classify_path};
use crate::file_organizer::{
    FileOrganizer, MoveOutcome, Operation, OrganizeError, OrganizeResult, SourceRoot,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// A directory entry observed during a pass.
#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub name: OsString,
    pub path: PathBuf,
    pub is_file: bool,
}

/// A file that could not be moved, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct FailedMove {
    pub path: PathBuf,
    pub reason: String,
}

/// What a single pass did.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// When the pass started.
    pub started_at: DateTime<Utc>,
    /// True when nothing was actually moved and `moved` lists planned moves.
    pub dry_run: bool,
    /// Files moved (or, in a dry run, that would be moved).
    pub moved: Vec<Operation>,
    /// Files that disappeared before they could be moved.
    pub vanished: Vec<PathBuf>,
    /// Files whose move failed.
    pub failed: Vec<FailedMove>,
    /// Files with no matching category, left in place.
    pub unclassified: Vec<PathBuf>,
    /// Files skipped by the filter rules.
    pub filtered: Vec<PathBuf>,
}

impl ScanReport {
    fn new(dry_run: bool) -> Self {
        Self {
            started_at: Utc::now(),
            dry_run,
            moved: Vec::new(),
            vanished: Vec::new(),
            failed: Vec::new(),
            unclassified: Vec::new(),
            filtered: Vec::new(),
        }
    }

    /// Returns true if nothing was moved and nothing went wrong.
    pub fn is_noop(&self) -> bool {
        self.moved.is_empty() && self.vanished.is_empty() && self.failed.is_empty()
    }

    /// Number of moved files per category label.
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for op in &self.moved {
            *counts.entry(op.category.label().to_string()).or_insert(0) += 1;
        }
        counts
    }

    fn record(&mut self, outcome: MoveOutcome) {
        match outcome {
            MoveOutcome::Moved(op) => self.moved.push(op),
            MoveOutcome::Vanished { path } => self.vanished.push(path),
            MoveOutcome::Failed { path, error } => self.failed.push(FailedMove {
                path,
                reason: error.to_string(),
            }),
        }
    }
}

/// Progress of a running pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress {
    pub processed: usize,
    pub total: usize,
}

/// Lists the direct entries of the root.
///
/// Symlinks count as files when they resolve to a regular file. Entries that
/// vanish while being listed are dropped.
pub fn pending_entries(root: &SourceRoot) -> OrganizeResult<Vec<PendingEntry>> {
    let entries = fs::read_dir(root.path()).map_err(|e| OrganizeError::InvalidSourceRoot {
        path: root.path().to_path_buf(),
        source: e,
    })?;

    let mut pending = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let is_file = match entry.file_type() {
            Ok(file_type) if file_type.is_symlink() => {
                fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false)
            }
            Ok(file_type) => file_type.is_file(),
            Err(_) => continue,
        };
        pending.push(PendingEntry {
            name: entry.file_name(),
            path,
            is_file,
        });
    }
    Ok(pending)
}

/// Runs one classify-and-move pass over the root.
///
/// Re-running it on an already sorted root changes nothing.
pub fn scan_once(root: &SourceRoot, filters: &CompiledFilters) -> OrganizeResult<ScanReport> {
    scan_with_progress(root, filters, |_| {})
}

/// Runs one pass, reporting progress after each entry.
pub fn scan_with_progress<F>(
    root: &SourceRoot,
    filters: &CompiledFilters,
    on_progress: F,
) -> OrganizeResult<ScanReport>
where
    F: FnMut(ScanProgress),
{
    let entries = pending_entries(root)?;
    Ok(place_entries(root, &entries, filters, on_progress))
}

/// Classifies and places entries that were listed earlier.
///
/// Entries removed since they were listed come back as vanished.
pub fn place_entries<F>(
    root: &SourceRoot,
    entries: &[PendingEntry],
    filters: &CompiledFilters,
    mut on_progress: F,
) -> ScanReport
where
    F: FnMut(ScanProgress),
{
    let mut report = ScanReport::new(false);
    let total = entries.len();

    for (index, entry) in entries.iter().enumerate() {
        if let Some(category) = route(entry, filters, &mut report) {
            report.record(FileOrganizer::place(root.path(), &entry.path, category));
        }
        on_progress(ScanProgress {
            processed: index + 1,
            total,
        });
    }

    info!(
        root = %root.path().display(),
        moved = report.moved.len(),
        vanished = report.vanished.len(),
        failed = report.failed.len(),
        unclassified = report.unclassified.len(),
        "scan pass complete"
    );
    report
}

/// Classifies the root without moving anything.
///
/// The returned report lists the destinations a real pass would use right
/// now.
pub fn preview(root: &SourceRoot, filters: &CompiledFilters) -> OrganizeResult<ScanReport> {
    let mut report = ScanReport::new(true);
    for entry in pending_entries(root)? {
        if let Some(category) = route(&entry, filters, &mut report)
            && let Some(new_path) =
                FileOrganizer::planned_destination(root.path(), &entry.path, category)
        {
            report.moved.push(Operation {
                original_path: entry.path.clone(),
                new_path,
                category,
            });
        }
    }
    Ok(report)
}

/// Decides what to do with one entry, recording skips in the report.
fn route(
    entry: &PendingEntry,
    filters: &CompiledFilters,
    report: &mut ScanReport,
) -> Option<Category> {
    if !entry.is_file {
        return None;
    }
    if !filters.should_include(&entry.path) {
        debug!(path = %entry.path.display(), "filtered out");
        report.filtered.push(entry.path.clone());
        return None;
    }
    match classify_path(&entry.path) {
        Some(category) => Some(category),
        None => {
            debug!(path = %entry.path.display(), "no category, leaving in place");
            report.unclassified.push(entry.path.clone());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterRules;
    use tempfile::TempDir;

    fn setup(files: &[&str]) -> (TempDir, SourceRoot) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = SourceRoot::establish(temp_dir.path()).expect("Failed to establish root");
        for name in files {
            fs::write(root.path().join(name), name.as_bytes()).expect("Failed to write file");
        }
        (temp_dir, root)
    }

    #[test]
    fn test_pending_entries_lists_direct_children_only() {
        let (_temp_dir, root) = setup(&["a.jpg"]);
        fs::write(root.path().join("Image").join("nested.png"), "x").unwrap();

        let entries = pending_entries(&root).unwrap();
        let files: Vec<_> = entries.iter().filter(|e| e.is_file).collect();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, OsString::from("a.jpg"));
        // Only the seven top-level category folders sit directly under the root.
        assert_eq!(entries.iter().filter(|e| !e.is_file).count(), 7);
    }

    #[test]
    fn test_scan_once_sorts_and_reports() {
        let (_temp_dir, root) = setup(&["song.mp3", "invoice.csv", "data.bin", "tool.py"]);

        let report = scan_once(&root, &CompiledFilters::default()).unwrap();

        assert_eq!(report.moved.len(), 3);
        assert_eq!(report.unclassified, vec![root.path().join("data.bin")]);
        assert!(root.path().join("Music").join("song.mp3").exists());
        assert!(root.path().join("Documents/CSV/invoice.csv").exists());
        assert!(root.path().join("Scripts").join("tool.py").exists());
        assert!(root.path().join("data.bin").exists());

        let counts = report.category_counts();
        assert_eq!(counts.get("Music"), Some(&1));
        assert_eq!(counts.get("Documents/CSV"), Some(&1));
    }

    #[test]
    fn test_scan_once_skips_directories_named_like_files() {
        let (_temp_dir, root) = setup(&[]);
        fs::create_dir(root.path().join("album.mp3")).unwrap();

        let report = scan_once(&root, &CompiledFilters::default()).unwrap();
        assert!(report.is_noop());
        assert!(root.path().join("album.mp3").is_dir());
    }

    #[test]
    fn test_second_pass_is_noop() {
        let (_temp_dir, root) = setup(&["a.png", "b.zip", "c.txt"]);

        let first = scan_once(&root, &CompiledFilters::default()).unwrap();
        assert_eq!(first.moved.len(), 3);

        let second = scan_once(&root, &CompiledFilters::default()).unwrap();
        assert!(second.is_noop());
    }

    #[test]
    fn test_filtered_files_stay() {
        let (_temp_dir, root) = setup(&["movie.mp4", "draft.mp4"]);
        let filters = FilterRules {
            exclude_patterns: vec!["draft*".to_string()],
            ..FilterRules::default()
        }
        .compile()
        .unwrap();

        let report = scan_once(&root, &filters).unwrap();
        assert_eq!(report.moved.len(), 1);
        assert_eq!(report.filtered, vec![root.path().join("draft.mp4")]);
        assert!(root.path().join("draft.mp4").exists());
    }

    #[test]
    fn test_progress_reaches_total() {
        let (_temp_dir, root) = setup(&["a.png", "b.gif"]);
        let mut last = None;

        scan_with_progress(&root, &CompiledFilters::default(), |p| last = Some(p)).unwrap();

        let last = last.expect("progress should be reported");
        assert_eq!(last.processed, last.total);
        assert_eq!(last.total, 9); // 2 files + 7 category directories
    }

    #[test]
    fn test_entry_removed_after_listing_is_vanished() {
        let (_temp_dir, root) = setup(&["a.jpg", "ghost.pdf", "b.mp3"]);
        let entries = pending_entries(&root).unwrap();
        fs::remove_file(root.path().join("ghost.pdf")).unwrap();

        let report = place_entries(&root, &entries, &CompiledFilters::default(), |_| {});

        assert_eq!(report.vanished, vec![root.path().join("ghost.pdf")]);
        assert_eq!(report.moved.len(), 2);
        assert!(report.failed.is_empty());
        assert!(root.path().join("Image").join("a.jpg").exists());
        assert!(root.path().join("Music").join("b.mp3").exists());
    }

    #[test]
    fn test_preview_moves_nothing() {
        let (_temp_dir, root) = setup(&["report.pdf"]);
        fs::write(root.path().join("Documents/PDF/report.pdf"), "old").unwrap();

        let report = preview(&root, &CompiledFilters::default()).unwrap();

        assert!(report.dry_run);
        assert_eq!(report.moved.len(), 1);
        assert_eq!(
            report.moved[0].new_path,
            root.path().join("Documents/PDF/report(1).pdf")
        );
        assert!(root.path().join("report.pdf").exists());
    }

    #[test]
    fn test_scan_unreadable_root_fails() {
        let (temp_dir, root) = setup(&[]);
        let path = temp_dir.path().to_path_buf();
        drop(temp_dir);

        assert!(!path.exists());
        assert!(matches!(
            scan_once(&root, &CompiledFilters::default()),
            Err(OrganizeError::InvalidSourceRoot { .. })
        ));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let (_temp_dir, root) = setup(&["clip.mov"]);
        let report = scan_once(&root, &CompiledFilters::default()).unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["moved"][0]["category"], "Video");
        assert_eq!(json["dry_run"], false);
    }
}
