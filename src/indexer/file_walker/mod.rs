//! Source file discovery for directory traversal

use crate::config::DiscoveryConfig;
use crate::error::DiscoveryError;
use crate::glob_utils::{PathPattern, compile_patterns, matches_any};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Lazily yielded discovery results
pub type DiscoveredFiles = Box<dyn Iterator<Item = Result<PathBuf, DiscoveryError>>>;

pub struct FileWalker {
    pub(crate) root: PathBuf,
    pub(crate) extensions: Vec<String>,
    pub(crate) exclude_patterns: Vec<String>,
    pub(crate) respect_gitignore: bool,
    pub(crate) follow_links: bool,
}

impl FileWalker {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extensions: vec!["py".to_string()],
            exclude_patterns: vec![],
            respect_gitignore: false,
            follow_links: false,
        }
    }

    /// Build a walker from the discovery section of the configuration
    pub fn from_config(root: impl AsRef<Path>, config: &DiscoveryConfig) -> Self {
        Self::new(root)
            .with_extensions(config.extensions.clone())
            .with_exclude_patterns(config.exclude_patterns.clone())
            .with_gitignore(config.respect_gitignore)
            .with_follow_links(config.follow_links)
    }

    /// Extensions (without the dot) of the files to yield
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_exclude_patterns(mut self, exclude_patterns: Vec<String>) -> Self {
        self.exclude_patterns = exclude_patterns;
        self
    }

    /// Apply `.gitignore`, `.ignore` and git exclude rules while walking
    pub fn with_gitignore(mut self, respect_gitignore: bool) -> Self {
        self.respect_gitignore = respect_gitignore;
        self
    }

    pub fn with_follow_links(mut self, follow_links: bool) -> Self {
        self.follow_links = follow_links;
        self
    }

    /// Walk the directory tree, yielding every matching source file once.
    ///
    /// Entries are sorted by file name within each directory. Fails up front
    /// when the root is missing or is not a directory; I/O failures on
    /// individual entries are yielded as `Err` items.
    pub fn walk(&self) -> Result<DiscoveredFiles, DiscoveryError> {
        if !self.root.exists() {
            return Err(DiscoveryError::InvalidDirectory(format!(
                "{} does not exist",
                self.root.display()
            )));
        }
        if !self.root.is_dir() {
            return Err(DiscoveryError::InvalidDirectory(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }

        let filter = PathFilter {
            root: self.root.clone(),
            extensions: self.extensions.clone(),
            excludes: compile_patterns(&self.exclude_patterns),
        };

        tracing::debug!(
            "Walking {:?} (extensions: {:?}, gitignore: {})",
            self.root,
            self.extensions,
            self.respect_gitignore
        );

        if self.respect_gitignore {
            Ok(Box::new(self.walk_ignoring(filter)))
        } else {
            Ok(Box::new(self.walk_all(filter)))
        }
    }

    /// Plain recursive walk, every directory included
    fn walk_all(
        &self,
        filter: PathFilter,
    ) -> impl Iterator<Item = Result<PathBuf, DiscoveryError>> + use<> {
        WalkDir::new(&self.root)
            .follow_links(self.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) if is_file_or_link_to_file(entry.file_type(), entry.path()) => {
                    filter.accepts(entry.path()).then(|| Ok(entry.into_path()))
                }
                Ok(_) => None,
                Err(e) => Some(Err(DiscoveryError::WalkFailed(e.to_string()))),
            })
    }

    /// Walk that honors ignore files
    fn walk_ignoring(
        &self,
        filter: PathFilter,
    ) -> impl Iterator<Item = Result<PathBuf, DiscoveryError>> + use<> {
        WalkBuilder::new(&self.root)
            .standard_filters(true) // Respect .gitignore, .ignore, etc.
            .hidden(false) // Don't skip hidden files
            .require_git(false) // Don't require a .git directory
            .follow_links(self.follow_links)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build()
            .filter_map(move |entry| match entry {
                Ok(entry) => {
                    let is_file = entry
                        .file_type()
                        .is_some_and(|t| is_file_or_link_to_file(t, entry.path()));
                    // The .git directory itself is not covered by ignore rules
                    let in_git_dir = entry
                        .path()
                        .components()
                        .any(|c| c.as_os_str() == ".git");

                    (is_file && !in_git_dir && filter.accepts(entry.path()))
                        .then(|| Ok(entry.into_path()))
                }
                Err(e) => Some(Err(DiscoveryError::WalkFailed(e.to_string()))),
            })
    }
}

/// Symlinked files are cataloged like regular ones even when links are not
/// followed; a link to a directory is only descended with `follow_links`.
fn is_file_or_link_to_file(file_type: std::fs::FileType, path: &Path) -> bool {
    file_type.is_file() || (file_type.is_symlink() && path.is_file())
}

/// Extension and exclude-pattern checks applied to each walked file
struct PathFilter {
    root: PathBuf,
    extensions: Vec<String>,
    excludes: Vec<PathPattern>,
}

impl PathFilter {
    fn accepts(&self, path: &Path) -> bool {
        let has_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|wanted| wanted == ext));
        if !has_extension {
            return false;
        }

        let relative = relative_path(&self.root, path);
        if matches_any(&relative, &self.excludes) {
            tracing::debug!("Excluded by pattern: {}", relative);
            return false;
        }

        true
    }
}

/// `path` relative to `root`, with `/` separators
pub(crate) fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .to_string_lossy()
        .replace(std::path::MAIN_SEPARATOR, "/")
}
