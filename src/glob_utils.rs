//! Glob pattern matching utilities for path filtering

use globset::{Glob, GlobMatcher};

/// A compiled exclude pattern
#[derive(Debug, Clone)]
pub enum PathPattern {
    Glob(GlobMatcher),
    /// Patterns that are not valid globs match as plain substrings
    Substring(String),
}

impl PathPattern {
    pub fn compile(pattern: &str) -> Self {
        match Glob::new(pattern) {
            Ok(glob) => PathPattern::Glob(glob.compile_matcher()),
            Err(e) => {
                tracing::warn!(
                    "Invalid glob pattern '{}', falling back to substring match: {}",
                    pattern,
                    e
                );
                PathPattern::Substring(pattern.to_string())
            }
        }
    }

    /// Check a `/`-separated path.
    ///
    /// Globs are tried against the whole path and then against every suffix
    /// starting at a component boundary, so `build/**` matches `pkg/build/x.py`.
    pub fn is_match(&self, path: &str) -> bool {
        match self {
            PathPattern::Substring(needle) => path.contains(needle.as_str()),
            PathPattern::Glob(matcher) => {
                let path = path.trim_start_matches('/');
                if matcher.is_match(path) {
                    return true;
                }

                let parts: Vec<&str> = path.split('/').collect();
                (1..parts.len()).any(|i| matcher.is_match(parts[i..].join("/")))
            }
        }
    }
}

/// Compile patterns for repeated matching
pub fn compile_patterns(patterns: &[String]) -> Vec<PathPattern> {
    patterns.iter().map(|p| PathPattern::compile(p)).collect()
}

/// Check if a path matches any compiled pattern. No patterns match nothing.
pub fn matches_any(path: &str, patterns: &[PathPattern]) -> bool {
    patterns.iter().any(|pattern| pattern.is_match(path))
}
