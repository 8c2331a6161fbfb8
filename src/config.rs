//! Runtime settings and entry filtering.
//!
//! There is no configuration file: the extension table is built in, and the
//! remaining knobs (debounce timing and which root entries a scan pass should
//! leave alone) are carried by a [`SorterConfig`] value that the caller
//! assembles, usually from command-line flags.
//!
//! Filtering supports several strategies:
//! - Hidden file toggle
//! - Exact filename matching
//! - File extension matching
//! - Glob pattern matching
//! - Regex pattern matching
//! - Include (whitelist) globs that override every exclude rule
//!
//! ```
//! use filesorter::config::{FilterRules, SorterConfig};
//! use std::time::Duration;
//!
//! let config = SorterConfig::default()
//!     .with_debounce(Duration::from_millis(250))
//!     .with_filters(FilterRules {
//!         exclude_extensions: vec!["part".to_string()],
//!         ..FilterRules::default()
//!     });
//! let filters = config.filters.clone().compile().unwrap();
//! assert!(!filters.should_include(std::path::Path::new("movie.mp4.part")));
//! ```

use glob::Pattern;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Default wait after the last change notification before a pass runs.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(1);

/// Default upper bound on how long a continuous burst may postpone a pass.
pub const DEFAULT_MAX_DEBOUNCE: Duration = Duration::from_secs(10);

/// Errors that can occur while validating settings.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// Debounce bounds are inconsistent.
    InvalidDebounce {
        debounce: Duration,
        max_debounce: Duration,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::InvalidDebounce {
                debounce,
                max_debounce,
            } => write!(
                f,
                "Debounce delay {:?} exceeds the maximum debounce {:?}",
                debounce, max_debounce
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings for a sorting session.
#[derive(Debug, Clone)]
pub struct SorterConfig {
    /// Quiet period required after the last change notification.
    pub debounce: Duration,
    /// Longest a burst of notifications can delay a pass.
    pub max_debounce: Duration,
    /// Which root entries a pass should skip.
    pub filters: FilterRules,
}

impl SorterConfig {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_max_debounce(mut self, max_debounce: Duration) -> Self {
        self.max_debounce = max_debounce;
        self
    }

    pub fn with_filters(mut self, filters: FilterRules) -> Self {
        self.filters = filters;
        self
    }

    /// Checks that the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns an error if `debounce` exceeds `max_debounce` or if any filter
    /// pattern fails to compile.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce > self.max_debounce {
            return Err(ConfigError::InvalidDebounce {
                debounce: self.debounce,
                max_debounce: self.max_debounce,
            });
        }
        self.filters.clone().compile().map(|_| ())
    }
}

impl Default for SorterConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            max_debounce: DEFAULT_MAX_DEBOUNCE,
            filters: FilterRules::default(),
        }
    }
}

/// Rules deciding which root entries a pass leaves untouched.
///
/// The default excludes nothing, so every regular file is offered to the
/// classifier.
#[derive(Debug, Clone)]
pub struct FilterRules {
    /// Whether hidden files (starting with ".") are considered.
    pub include_hidden: bool,
    /// Exact filenames to exclude (e.g., ".DS_Store", "Thumbs.db").
    pub exclude_filenames: Vec<String>,
    /// File extensions to exclude, without the dot (e.g., "part", "crdownload").
    pub exclude_extensions: Vec<String>,
    /// Glob patterns to exclude (e.g., "*.tmp").
    pub exclude_patterns: Vec<String>,
    /// Regex patterns matched against the file name.
    pub exclude_regex: Vec<String>,
    /// Glob patterns that override exclude rules.
    pub include_patterns: Vec<String>,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            include_hidden: true,
            exclude_filenames: Vec::new(),
            exclude_extensions: Vec::new(),
            exclude_patterns: Vec::new(),
            exclude_regex: Vec::new(),
            include_patterns: Vec::new(),
        }
    }
}

impl FilterRules {
    /// Compile rules into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile(self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(self)
    }
}

/// Compiled filter structures for matching root entries.
///
/// Patterns are parsed once per session rather than once per file.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    include_hidden: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    fn new(rules: FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = compile_globs(&rules.exclude_patterns)?;
        let include_patterns = compile_globs(&rules.include_patterns)?;

        let exclude_regexes = rules
            .exclude_regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            include_hidden: rules.include_hidden,
            exclude_filenames: rules.exclude_filenames.into_iter().collect(),
            exclude_extensions: rules
                .exclude_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
        })
    }

    /// Check if a root entry should be offered to the classifier.
    ///
    /// Patterns are matched against the file name only, since a pass never
    /// looks below the root.
    ///
    /// Checks are performed in this order, with early termination:
    /// 1. Include patterns (whitelist) - if matched, always include
    /// 2. Hidden file filter - if hidden and disabled, exclude
    /// 3. Exact filename match - if matched, exclude
    /// 4. File extension match - if matched, exclude
    /// 5. Glob pattern match - if matched, exclude
    /// 6. Regex pattern match - if matched, exclude
    /// 7. Default: include
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.include_patterns.iter().any(|p| p.matches(&file_name)) {
            return true;
        }

        if !self.include_hidden && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = file_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self.exclude_patterns.iter().any(|p| p.matches(&file_name)) {
            return false;
        }

        if self.exclude_regexes.iter().any(|r| r.is_match(&file_name)) {
            return false;
        }

        true
    }
}

impl Default for CompiledFilters {
    fn default() -> Self {
        Self {
            include_hidden: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}
