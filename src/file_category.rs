/// Extension-based file classification.
///
/// This module maps a file name to the category subdirectory it belongs in.
/// Classification looks only at the lower-cased extension (the text from the
/// last `.` to the end, dot included) and consults a static table built from
/// ordered extension groups.
///
/// # Examples
///
/// ```
/// use filesorter::file_category::{Category, DocumentKind, classify};
///
/// assert_eq!(classify("holiday.JPG"), Some(Category::Image));
/// assert_eq!(classify("invoice.csv"), Some(Category::Documents(DocumentKind::Csv)));
/// assert_eq!(classify("notes"), None);
/// ```
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Second-level routing inside the `Documents` directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// `.pdf`
    Pdf,
    /// `.csv`, `.xls`, `.xlsx`
    Csv,
    /// `.txt`
    Text,
    /// `.doc`, `.docx`, `.odt`
    Word,
    /// `.ppt`, `.pptx`
    Ppt,
}

impl DocumentKind {
    /// Every document sub-category, in the order the directories are created.
    pub const ALL: [DocumentKind; 5] = [
        DocumentKind::Pdf,
        DocumentKind::Csv,
        DocumentKind::Text,
        DocumentKind::Ppt,
        DocumentKind::Word,
    ];

    /// Returns the directory name under `Documents/`.
    pub fn dir_name(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "PDF",
            DocumentKind::Csv => "CSV",
            DocumentKind::Text => "Text",
            DocumentKind::Word => "Word",
            DocumentKind::Ppt => "PPT",
        }
    }
}

/// Destination a file is routed to, relative to the source root.
///
/// Most categories are a single directory; documents are split one level
/// further by [`DocumentKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Music,
    Video,
    Image,
    Design,
    Archives,
    Scripts,
    Documents(DocumentKind),
}

impl Category {
    /// Every leaf category, flat ones first and then the document subfolders.
    pub const ALL: [Category; 11] = [
        Category::Music,
        Category::Video,
        Category::Image,
        Category::Design,
        Category::Archives,
        Category::Scripts,
        Category::Documents(DocumentKind::Pdf),
        Category::Documents(DocumentKind::Csv),
        Category::Documents(DocumentKind::Text),
        Category::Documents(DocumentKind::Ppt),
        Category::Documents(DocumentKind::Word),
    ];

    /// Returns the top-level directory name for this category.
    ///
    /// ```
    /// use filesorter::file_category::{Category, DocumentKind};
    ///
    /// assert_eq!(Category::Music.dir_name(), "Music");
    /// assert_eq!(Category::Documents(DocumentKind::Pdf).dir_name(), "Documents");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Music => "Music",
            Category::Video => "Video",
            Category::Image => "Image",
            Category::Design => "Design",
            Category::Archives => "Archives",
            Category::Scripts => "Scripts",
            Category::Documents(_) => "Documents",
        }
    }

    /// Returns the path of this category relative to the source root.
    pub fn relative_path(&self) -> PathBuf {
        match self {
            Category::Documents(kind) => Path::new(self.dir_name()).join(kind.dir_name()),
            _ => PathBuf::from(self.dir_name()),
        }
    }

    /// Returns the slash-separated label, e.g. `Documents/PDF`.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Documents(DocumentKind::Pdf) => "Documents/PDF",
            Category::Documents(DocumentKind::Csv) => "Documents/CSV",
            Category::Documents(DocumentKind::Text) => "Documents/Text",
            Category::Documents(DocumentKind::Word) => "Documents/Word",
            Category::Documents(DocumentKind::Ppt) => "Documents/PPT",
            _ => self.dir_name(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// A named set of extensions that share a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionGroup {
    Audio,
    Video,
    Image,
    Document,
    Design,
    Archive,
    Script,
}

const AUDIO: &[&str] = &[".m4a", ".flac", ".mp3", ".wav", ".wma", ".aac"];

const VIDEO: &[&str] = &[
    ".webm", ".mpg", ".mp2", ".mpeg", ".mpe", ".mpv", ".ogg", ".mp4", ".mp4v", ".m4v", ".avi",
    ".wmv", ".mov", ".qt", ".flv", ".swf", ".avchd",
];

const IMAGE: &[&str] = &[
    ".jpg", ".jpeg", ".jpe", ".jif", ".jfif", ".jfi", ".png", ".gif", ".webp", ".tiff", ".tif",
    ".psd", ".raw", ".arw", ".cr2", ".nrw", ".k25", ".bmp", ".dib", ".heif", ".heic", ".ind",
    ".indd", ".indt", ".jp2", ".j2k", ".jpf", ".jpx", ".jpm", ".mj2", ".svg", ".svgz", ".ai",
    ".eps", ".ico",
];

const DOCUMENT: &[&str] = &[
    ".doc", ".docx", ".odt", ".txt", ".pdf", ".xls", ".xlsx", ".ppt", ".pptx", ".csv",
];

const DESIGN: &[&str] = &[".psd", ".ai", ".indd", ".indt"];

const ARCHIVE: &[&str] = &[".zip", ".rar", ".7z", ".tar", ".gz"];

const SCRIPT: &[&str] = &[
    ".py", ".java", ".cpp", ".c", ".cs", ".js", ".html", ".css", ".php", ".rb", ".r", ".go",
    ".sh", ".pl", ".swift", ".kt", ".ts", ".lua",
];

/// Extension groups in priority order. When an extension appears in more
/// than one group, the earliest group claims it.
pub const GROUP_PRIORITY: &[(ExtensionGroup, &[&str])] = &[
    (ExtensionGroup::Audio, AUDIO),
    (ExtensionGroup::Video, VIDEO),
    (ExtensionGroup::Image, IMAGE),
    (ExtensionGroup::Document, DOCUMENT),
    (ExtensionGroup::Design, DESIGN),
    (ExtensionGroup::Archive, ARCHIVE),
    (ExtensionGroup::Script, SCRIPT),
];

/// Sub-rules applied to extensions claimed by the document group.
pub const DOCUMENT_SUBRULES: &[(&str, DocumentKind)] = &[
    (".pdf", DocumentKind::Pdf),
    (".csv", DocumentKind::Csv),
    (".xls", DocumentKind::Csv),
    (".xlsx", DocumentKind::Csv),
    (".txt", DocumentKind::Text),
    (".doc", DocumentKind::Word),
    (".docx", DocumentKind::Word),
    (".odt", DocumentKind::Word),
    (".ppt", DocumentKind::Ppt),
    (".pptx", DocumentKind::Ppt),
];

impl ExtensionGroup {
    /// Resolves the destination for an extension claimed by this group.
    ///
    /// Document extensions without a sub-rule resolve to `None`.
    pub fn category_for(&self, ext: &str) -> Option<Category> {
        match self {
            ExtensionGroup::Audio => Some(Category::Music),
            ExtensionGroup::Video => Some(Category::Video),
            ExtensionGroup::Image => Some(Category::Image),
            ExtensionGroup::Design => Some(Category::Design),
            ExtensionGroup::Archive => Some(Category::Archives),
            ExtensionGroup::Script => Some(Category::Scripts),
            ExtensionGroup::Document => DOCUMENT_SUBRULES
                .iter()
                .find(|(sub_ext, _)| *sub_ext == ext)
                .map(|(_, kind)| Category::Documents(*kind)),
        }
    }
}

/// Lookup table from lower-cased extension to destination.
///
/// Each extension is claimed by exactly one group. A claim may resolve to
/// no category (a document extension without a sub-rule), in which case the
/// file stays where it is and later groups do not get a chance at it.
#[derive(Debug, Clone)]
pub struct ExtensionTable {
    claims: HashMap<String, (ExtensionGroup, Option<Category>)>,
}

impl ExtensionTable {
    /// Builds the table from groups listed in priority order.
    pub fn from_groups(groups: &[(ExtensionGroup, &[&str])]) -> Self {
        let mut claims = HashMap::new();
        for (group, extensions) in groups {
            for ext in extensions.iter() {
                let ext = ext.to_lowercase();
                let category = group.category_for(&ext);
                claims.entry(ext).or_insert((*group, category));
            }
        }
        Self { claims }
    }

    /// Returns the destination for an extension (dot included).
    pub fn lookup(&self, ext: &str) -> Option<Category> {
        self.claims
            .get(&ext.to_lowercase())
            .and_then(|(_, category)| *category)
    }

    /// Returns the group that claimed an extension.
    pub fn group_of(&self, ext: &str) -> Option<ExtensionGroup> {
        self.claims.get(&ext.to_lowercase()).map(|(group, _)| *group)
    }

    /// Number of distinct extensions in the table.
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

impl Default for ExtensionTable {
    fn default() -> Self {
        Self::from_groups(GROUP_PRIORITY)
    }
}

static BUILTIN_TABLE: LazyLock<ExtensionTable> = LazyLock::new(ExtensionTable::default);

/// Returns the lower-cased extension of a file name, dot included.
///
/// Names without a `.` have an empty extension.
///
/// ```
/// use filesorter::file_category::extension_of;
///
/// assert_eq!(extension_of("Backup.TAR.GZ"), ".gz");
/// assert_eq!(extension_of("Makefile"), "");
/// ```
pub fn extension_of(file_name: &str) -> String {
    let lower = file_name.to_lowercase();
    match lower.rfind('.') {
        Some(idx) => lower[idx..].to_string(),
        None => String::new(),
    }
}

/// Classifies a file name against the built-in extension table.
pub fn classify(file_name: &str) -> Option<Category> {
    BUILTIN_TABLE.lookup(&extension_of(file_name))
}

/// Classifies a path by its final component.
pub fn classify_path(path: &Path) -> Option<Category> {
    let name = path.file_name()?.to_string_lossy();
    classify(&name)
}
