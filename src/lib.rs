//! filesorter - keeps a directory tidy by sorting its files into category folders
//!
//! This library provides extension-based classification, collision-free
//! placement into a fixed category tree, one-shot scan passes, and a
//! debounced watcher that re-sorts the directory as new files arrive.

pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod logging;
pub mod output;
pub mod scanner;
pub mod watcher;

pub use config::{CompiledFilters, ConfigError, FilterRules, SorterConfig};
pub use file_category::{Category, DocumentKind, classify};
pub use file_organizer::{FileOrganizer, MoveOutcome, OrganizeError, OrganizeResult, SourceRoot};
pub use scanner::ScanReport;
pub use watcher::Watcher;

pub use cli::{SortCommand, run_cli};
