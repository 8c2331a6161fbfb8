/// Placing files into their category directories.
///
/// This module owns the destination side of sorting: establishing the
/// source root, creating (and if necessary repairing) the category tree
/// under it, choosing a collision-free destination name, and performing the
/// move. Per-file failures are reported as a [`MoveOutcome`] and never
/// escape [`FileOrganizer::place`].
use crate::config::ConfigError;
use crate::file_category::{Category, DocumentKind};
use serde::Serialize;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Represents a single completed move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    /// The path of the file before it was placed.
    pub original_path: PathBuf,
    /// The path the file now lives at.
    pub new_path: PathBuf,
    /// The category the file was routed to.
    pub category: Category,
}

/// Result of placing one file.
#[derive(Debug)]
pub enum MoveOutcome {
    /// The file now lives at `Operation::new_path`.
    Moved(Operation),
    /// The source disappeared before it could be moved, usually because
    /// another pass or another process got there first.
    Vanished { path: PathBuf },
    /// The move failed for any other reason; the file stays where it was.
    Failed { path: PathBuf, error: OrganizeError },
}

impl MoveOutcome {
    pub fn is_moved(&self) -> bool {
        matches!(self, MoveOutcome::Moved(_))
    }

    /// Final destination, if the move succeeded.
    pub fn destination(&self) -> Option<&Path> {
        match self {
            MoveOutcome::Moved(op) => Some(&op.new_path),
            _ => None,
        }
    }
}

/// Errors that can occur while establishing a root or moving files.
#[derive(Debug)]
pub enum OrganizeError {
    /// The source root does not exist or is not a directory.
    InvalidSourceRoot { path: PathBuf, source: io::Error },
    /// Failed to create a category directory.
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// A non-directory sat at a category path and could not be removed.
    DirectoryRepairFailed { path: PathBuf, source: io::Error },
    /// Failed to move a file to its category directory.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: io::Error,
    },
    /// The change-notification subscription could not be registered.
    WatchFailed {
        path: PathBuf,
        source: notify::Error,
    },
    /// The background worker panicked instead of shutting down.
    WorkerPanicked,
    /// The session settings were rejected.
    InvalidConfig(ConfigError),
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSourceRoot { path, source } => {
                write!(f, "Invalid source root {}: {}", path.display(), source)
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::DirectoryRepairFailed { path, source } => {
                write!(
                    f,
                    "Failed to replace non-directory at {}: {}",
                    path.display(),
                    source
                )
            }
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::WatchFailed { path, source } => {
                write!(f, "Failed to watch {}: {}", path.display(), source)
            }
            Self::WorkerPanicked => write!(f, "Watcher worker thread panicked"),
            Self::InvalidConfig(e) => write!(f, "Invalid configuration: {}", e),
        }
    }
}

impl std::error::Error for OrganizeError {}

impl From<ConfigError> for OrganizeError {
    fn from(e: ConfigError) -> Self {
        Self::InvalidConfig(e)
    }
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// The directory under observation and reorganization.
///
/// A `SourceRoot` only exists once its category tree has been created, so
/// holding one means moves have somewhere to go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRoot {
    path: PathBuf,
}

impl SourceRoot {
    /// Validates `path` and creates the category tree beneath it.
    ///
    /// Any regular file (or dangling link) found where a category directory
    /// belongs is deleted and replaced with a directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is missing or not a directory, or if a
    /// category directory cannot be created.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use filesorter::file_organizer::SourceRoot;
    ///
    /// let root = SourceRoot::establish("/home/me/Downloads").unwrap();
    /// assert!(root.path().join("Documents").join("PDF").is_dir());
    /// ```
    pub fn establish(path: impl AsRef<Path>) -> OrganizeResult<Self> {
        let root = Self::open_existing(path)?;

        let repaired = prepare_category_tree(&root.path)?;
        if !repaired.is_empty() {
            warn!(
                root = %root.path.display(),
                repaired = repaired.len(),
                "replaced non-directories in category tree"
            );
        }
        info!(root = %root.path.display(), "source root ready");

        Ok(root)
    }

    /// Validates `path` without touching its contents.
    ///
    /// Used where the category tree must not be created, such as a dry run.
    pub fn open_existing(path: impl AsRef<Path>) -> OrganizeResult<Self> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|e| OrganizeError::InvalidSourceRoot {
            path: path.to_path_buf(),
            source: e,
        })?;
        if !metadata.is_dir() {
            return Err(OrganizeError::InvalidSourceRoot {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            });
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absolute directory for a category under this root.
    pub fn category_dir(&self, category: Category) -> PathBuf {
        self.path.join(category.relative_path())
    }
}

/// Paths of every category directory, relative to the root, parents first.
pub fn category_tree_paths() -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for category in Category::ALL {
        let top = PathBuf::from(category.dir_name());
        if !paths.contains(&top) {
            paths.push(top);
        }
    }
    for kind in DocumentKind::ALL {
        paths.push(Category::Documents(kind).relative_path());
    }
    paths
}

/// Creates every category directory under `root`.
///
/// Idempotent for directories that already exist. Returns the paths where a
/// non-directory had to be deleted first.
pub fn prepare_category_tree(root: &Path) -> OrganizeResult<Vec<PathBuf>> {
    let mut repaired = Vec::new();
    for relative in category_tree_paths() {
        let path = root.join(relative);
        if ensure_directory(&path)? {
            repaired.push(path);
        }
    }
    Ok(repaired)
}

/// Makes sure `path` is a directory, deleting whatever else is in the way.
fn ensure_directory(path: &Path) -> OrganizeResult<bool> {
    let mut repaired = false;
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => return Ok(false),
        // A link that resolves to a directory is good enough.
        Ok(meta) if meta.file_type().is_symlink() && path.is_dir() => return Ok(false),
        Ok(_) => {
            warn!(path = %path.display(), "category path is not a directory, replacing it");
            fs::remove_file(path).map_err(|e| OrganizeError::DirectoryRepairFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
            repaired = true;
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(OrganizeError::DirectoryCreationFailed {
                path: path.to_path_buf(),
                source: e,
            });
        }
    }

    fs::create_dir_all(path).map_err(|e| OrganizeError::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(path = %path.display(), "category directory created");
    Ok(repaired)
}

/// Picks the first free destination for `file_name` inside `dest_dir`.
///
/// If `dest_dir/file_name` is taken, the stem gets a `(n)` suffix with the
/// lowest `n >= 1` whose path does not exist: `report.pdf` becomes
/// `report(1).pdf`, then `report(2).pdf`.
///
/// The check is advisory. Another writer can still claim the name between
/// this call and the move.
pub fn resolve_destination(dest_dir: &Path, file_name: &OsStr) -> PathBuf {
    let candidate = dest_dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let name = Path::new(file_name);
    let stem = name.file_stem().unwrap_or(file_name);
    let extension = name.extension();

    let mut counter: u64 = 1;
    loop {
        let mut numbered = OsString::from(stem);
        numbered.push(format!("({})", counter));
        if let Some(ext) = extension {
            numbered.push(".");
            numbered.push(ext);
        }
        let candidate = dest_dir.join(numbered);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Moves files into category directories under a root.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Moves `source_path` into `category` under `root`.
    ///
    /// Never returns an error: a source that disappeared mid-move is
    /// reported as [`MoveOutcome::Vanished`], anything else as
    /// [`MoveOutcome::Failed`]. Nothing is retried.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use filesorter::file_category::Category;
    /// use filesorter::file_organizer::{FileOrganizer, MoveOutcome};
    /// use std::path::Path;
    ///
    /// let outcome = FileOrganizer::place(
    ///     Path::new("/path/to/root"),
    ///     Path::new("/path/to/root/image.png"),
    ///     Category::Image,
    /// );
    /// if let MoveOutcome::Moved(op) = outcome {
    ///     println!("Moved to {}", op.new_path.display());
    /// }
    /// ```
    pub fn place(root: &Path, source_path: &Path, category: Category) -> MoveOutcome {
        match Self::move_to_category(root, source_path, category) {
            Ok(operation) => {
                info!(
                    from = %operation.original_path.display(),
                    to = %operation.new_path.display(),
                    category = %category,
                    "moved"
                );
                MoveOutcome::Moved(operation)
            }
            Err(err) if Self::source_vanished(source_path, &err) => {
                warn!(path = %source_path.display(), "file vanished before it could be moved");
                MoveOutcome::Vanished {
                    path: source_path.to_path_buf(),
                }
            }
            Err(err) => {
                error!(path = %source_path.display(), error = %err, "move failed");
                MoveOutcome::Failed {
                    path: source_path.to_path_buf(),
                    error: err,
                }
            }
        }
    }

    /// Computes where `source_path` would land without moving it.
    pub fn planned_destination(
        root: &Path,
        source_path: &Path,
        category: Category,
    ) -> Option<PathBuf> {
        let file_name = source_path.file_name()?;
        Some(resolve_destination(
            &root.join(category.relative_path()),
            file_name,
        ))
    }

    /// Moves a file and records the operation, propagating any failure.
    pub fn move_to_category(
        root: &Path,
        source_path: &Path,
        category: Category,
    ) -> OrganizeResult<Operation> {
        let category_path = root.join(category.relative_path());

        let file_name = source_path
            .file_name()
            .ok_or_else(|| OrganizeError::FileMoveFailure {
                source: source_path.to_path_buf(),
                destination: category_path.clone(),
                source_error: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "file has no name component",
                ),
            })?;

        let destination_path = resolve_destination(&category_path, file_name);

        relocate(source_path, &destination_path).map_err(|e| OrganizeError::FileMoveFailure {
            source: source_path.to_path_buf(),
            destination: destination_path.clone(),
            source_error: e,
        })?;

        Ok(Operation {
            original_path: source_path.to_path_buf(),
            new_path: destination_path,
            category,
        })
    }

    fn source_vanished(source_path: &Path, err: &OrganizeError) -> bool {
        matches!(
            err,
            OrganizeError::FileMoveFailure { source_error, .. }
                if source_error.kind() == io::ErrorKind::NotFound
        ) && fs::symlink_metadata(source_path).is_err()
    }
}

/// Renames, falling back to copy and delete across filesystems.
fn relocate(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(from = %from.display(), "rename crosses devices, copying instead");
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, SourceRoot) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = SourceRoot::establish(temp_dir.path()).expect("Failed to establish root");
        (temp_dir, root)
    }

    #[test]
    fn test_establish_creates_category_tree() {
        let (_temp_dir, root) = setup();

        for dir in ["Music", "Video", "Image", "Design", "Archives", "Scripts", "Documents"] {
            assert!(root.path().join(dir).is_dir(), "{} should exist", dir);
        }
        for sub in ["PDF", "CSV", "Text", "PPT", "Word"] {
            assert!(root.path().join("Documents").join(sub).is_dir());
        }
        assert_eq!(category_tree_paths().len(), 12);
    }

    #[test]
    fn test_establish_is_idempotent() {
        let (temp_dir, root) = setup();
        let kept = root.category_dir(Category::Image).join("kept.png");
        fs::write(&kept, "data").expect("Failed to write file");

        let again = SourceRoot::establish(temp_dir.path()).expect("Second establish failed");
        assert_eq!(again, root);
        assert!(kept.exists(), "existing category contents must survive");
    }

    #[test]
    fn test_establish_replaces_file_at_category_path() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let image = temp_dir.path().join("Image");
        fs::write(&image, "not a directory").expect("Failed to write file");

        let repaired = prepare_category_tree(temp_dir.path()).expect("Repair failed");

        assert_eq!(repaired, vec![image.clone()]);
        assert!(image.is_dir());
        assert_eq!(fs::read_dir(&image).unwrap().count(), 0);
    }

    #[test]
    fn test_establish_repairs_nested_document_path() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("Documents"), "file").expect("Failed to write file");

        let root = SourceRoot::establish(temp_dir.path()).expect("Establish failed");
        assert!(root.category_dir(Category::Documents(DocumentKind::Csv)).is_dir());
    }

    #[test]
    fn test_establish_invalid_root() {
        let result = SourceRoot::establish("/non/existent/path");
        assert!(matches!(result, Err(OrganizeError::InvalidSourceRoot { .. })));

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join("plain.txt");
        fs::write(&file, "x").expect("Failed to write file");
        assert!(matches!(
            SourceRoot::establish(&file),
            Err(OrganizeError::InvalidSourceRoot { .. })
        ));
    }

    #[test]
    fn test_resolve_destination_free_name() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dest = resolve_destination(temp_dir.path(), OsStr::new("report.pdf"));
        assert_eq!(dest, temp_dir.path().join("report.pdf"));
    }

    #[test]
    fn test_resolve_destination_probes_lowest_free_index() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("report.pdf"), "a").unwrap();
        assert_eq!(
            resolve_destination(dir, OsStr::new("report.pdf")),
            dir.join("report(1).pdf")
        );

        fs::write(dir.join("report(1).pdf"), "b").unwrap();
        fs::write(dir.join("report(3).pdf"), "c").unwrap();
        assert_eq!(
            resolve_destination(dir, OsStr::new("report.pdf")),
            dir.join("report(2).pdf")
        );
    }

    #[test]
    fn test_resolve_destination_name_shapes() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        for name in ["backup.tar.gz", "Makefile", ".bashrc"] {
            fs::write(dir.join(name), "x").unwrap();
        }
        assert_eq!(
            resolve_destination(dir, OsStr::new("backup.tar.gz")),
            dir.join("backup.tar(1).gz")
        );
        assert_eq!(
            resolve_destination(dir, OsStr::new("Makefile")),
            dir.join("Makefile(1)")
        );
        assert_eq!(
            resolve_destination(dir, OsStr::new(".bashrc")),
            dir.join(".bashrc(1)")
        );
    }

    #[test]
    fn test_place_moves_into_category() {
        let (_temp_dir, root) = setup();
        let file_path = root.path().join("manual.pdf");
        fs::write(&file_path, "pdf").expect("Failed to write test file");

        let outcome = FileOrganizer::place(
            root.path(),
            &file_path,
            Category::Documents(DocumentKind::Pdf),
        );

        let expected = root.path().join("Documents").join("PDF").join("manual.pdf");
        assert_eq!(outcome.destination(), Some(expected.as_path()));
        assert!(!file_path.exists());
        assert_eq!(fs::read_to_string(expected).unwrap(), "pdf");
    }

    #[test]
    fn test_place_keeps_both_files_on_collision() {
        let (_temp_dir, root) = setup();
        let pdf_dir = root.category_dir(Category::Documents(DocumentKind::Pdf));
        fs::write(pdf_dir.join("report.pdf"), "first").unwrap();

        for round in 1..=2 {
            let incoming = root.path().join("report.pdf");
            fs::write(&incoming, "same").unwrap();
            let outcome = FileOrganizer::place(
                root.path(),
                &incoming,
                Category::Documents(DocumentKind::Pdf),
            );
            assert!(outcome.is_moved());
            assert!(pdf_dir.join(format!("report({}).pdf", round)).exists());
        }
        assert_eq!(fs::read_to_string(pdf_dir.join("report.pdf")).unwrap(), "first");
    }

    #[test]
    fn test_place_missing_source_is_vanished() {
        let (_temp_dir, root) = setup();
        let ghost = root.path().join("ghost.mp3");

        let outcome = FileOrganizer::place(root.path(), &ghost, Category::Music);
        assert!(matches!(outcome, MoveOutcome::Vanished { path } if path == ghost));
    }

    #[test]
    fn test_place_missing_destination_is_failure() {
        let (_temp_dir, root) = setup();
        fs::remove_dir(root.category_dir(Category::Archives)).unwrap();
        let file_path = root.path().join("bundle.zip");
        fs::write(&file_path, "zip").unwrap();

        let outcome = FileOrganizer::place(root.path(), &file_path, Category::Archives);
        assert!(matches!(outcome, MoveOutcome::Failed { .. }));
        assert!(file_path.exists(), "failed move must leave the source alone");
    }

    #[test]
    fn test_planned_destination_does_not_move() {
        let (_temp_dir, root) = setup();
        let file_path = root.path().join("clip.mov");
        fs::write(&file_path, "mov").unwrap();

        let planned =
            FileOrganizer::planned_destination(root.path(), &file_path, Category::Video).unwrap();
        assert_eq!(planned, root.path().join("Video").join("clip.mov"));
        assert!(file_path.exists());
    }
}
