//! Input discovery and ignore rules.
//!
//! A target is either a single file or a directory. Directories are walked
//! recursively; each directory may hold an ignore file listing entries
//! (relative to that directory) to leave out. Ignored directories are not
//! descended into.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::types::{SignatureConfig, SignatureError, SignatureResult};

/// Entries listed in one directory's ignore file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreList {
    entries: HashSet<String>,
}

impl IgnoreList {
    /// Parse ignore file text. Blank lines and `#` comments are skipped;
    /// trailing slashes are not significant.
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| line.trim_end_matches('/').to_string())
            .filter(|line| !line.is_empty())
            .collect();
        Self { entries }
    }

    /// Read the ignore file, if any, from `dir`.
    pub fn load(dir: &Path, file_name: &str) -> Self {
        let path = dir.join(file_name);
        match fs::read_to_string(&path) {
            Ok(text) => {
                debug!(path = %path.display(), "Loaded ignore list");
                Self::parse(&text)
            }
            Err(_) => Self::default(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Files resolved from a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovered {
    /// Root that report paths are made relative to.
    pub root: PathBuf,
    /// Files to process, in walk order.
    pub files: Vec<PathBuf>,
}

/// Walks targets and applies extension and ignore rules.
pub struct FileDiscovery {
    extension: Regex,
    ignore_file_name: String,
}

impl FileDiscovery {
    /// Create a discovery for files ending in `.{extension}`.
    pub fn new(extension: &str, ignore_file_name: impl Into<String>) -> SignatureResult<Self> {
        let pattern = format!(r"\.{}$", regex::escape(extension.trim_start_matches('.')));
        let extension = Regex::new(&pattern).map_err(|e| SignatureError::Input {
            path: extension.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
        })?;
        Ok(Self {
            extension,
            ignore_file_name: ignore_file_name.into(),
        })
    }

    pub fn from_config(config: &SignatureConfig) -> SignatureResult<Self> {
        Self::new(&config.file_extension, config.ignore_file_name.clone())
    }

    /// Whether `path` has the configured extension.
    pub fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(|name| self.extension.is_match(name))
            .unwrap_or(false)
    }

    /// Resolve a target into a root and its files. A file target is taken
    /// as is, with an empty root.
    pub fn discover(&self, target: &Path) -> SignatureResult<Discovered> {
        let metadata = fs::metadata(target).map_err(|source| SignatureError::Input {
            path: target.display().to_string(),
            source,
        })?;

        if metadata.is_file() {
            return Ok(Discovered {
                root: PathBuf::new(),
                files: vec![target.to_path_buf()],
            });
        }

        let mut ignores: HashMap<PathBuf, IgnoreList> = HashMap::new();
        let mut files = Vec::new();

        let walker = WalkDir::new(target)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_ignored(entry, &mut ignores));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_file() && self.matches(entry.path()) {
                files.push(entry.into_path());
            }
        }

        debug!(root = %target.display(), files = files.len(), "Discovery complete");

        Ok(Discovered {
            root: target.to_path_buf(),
            files,
        })
    }

    fn is_ignored(&self, entry: &DirEntry, ignores: &mut HashMap<PathBuf, IgnoreList>) -> bool {
        if entry.depth() == 0 {
            return false;
        }
        let Some(parent) = entry.path().parent() else {
            return false;
        };
        let list = ignores
            .entry(parent.to_path_buf())
            .or_insert_with(|| IgnoreList::load(parent, &self.ignore_file_name));
        let name = entry.file_name().to_string_lossy();
        let ignored = list.contains(&name);
        if ignored {
            debug!(path = %entry.path().display(), "Ignored");
        }
        ignored
    }
}
