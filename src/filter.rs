//! Path filtering for comparison reports.
//!
//! Glob-style patterns select which diffs of a [`Report`] are kept, so users
//! can drop noisy areas or focus on particular ones after the comparison.
//!
//! # Pattern Syntax
//!
//! Patterns are written like rendered paths, with `/` between segments and
//! `~1`/`~0` escapes inside a segment:
//!
//! - `spec` - matches the literal segment "spec"
//! - `*` - matches any single path segment
//! - `**` - matches any number of path segments (including zero)
//! - `/spec/containers/name=web` - matches a correlated list entry
//! - `/**/image` - matches "image" at any depth
//!
//! # Examples
//!
//! ```
//! use docdiff::filter::PathPattern;
//!
//! let pattern = PathPattern::parse("/metadata/annotations/*");
//! assert!(pattern.matches(&["metadata".to_string(), "annotations".to_string(), "a".to_string()]));
//!
//! let pattern = PathPattern::parse("/**/image");
//! assert!(pattern.matches(&["spec".to_string(), "name=web".to_string(), "image".to_string()]));
//! ```

use crate::diff::Report;
use crate::path::unescape_token;
use tracing::debug;

/// A single segment in a path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    /// Matches an exact token
    Literal(String),
    /// Matches any single path segment (*)
    SingleWildcard,
    /// Matches any number of path segments (**)
    DoubleWildcard,
}

/// A compiled path pattern for matching against diff paths.
#[derive(Debug, Clone)]
pub struct PathPattern {
    pub segments: Vec<PatternSegment>,
}

impl PathPattern {
    /// Compiles a pattern. A leading `/` is optional and `/` alone matches
    /// only the document root.
    pub fn parse(pattern: &str) -> Self {
        let trimmed = pattern.strip_prefix('/').unwrap_or(pattern);
        if trimmed.is_empty() {
            return Self {
                segments: Vec::new(),
            };
        }

        let segments = trimmed
            .split('/')
            .map(|s| match s {
                "**" => PatternSegment::DoubleWildcard,
                "*" => PatternSegment::SingleWildcard,
                _ => PatternSegment::Literal(unescape_token(s)),
            })
            .collect();
        Self { segments }
    }

    /// Matches unescaped path tokens, as returned by `Path::tokens`.
    pub fn matches(&self, path: &[String]) -> bool {
        Self::matches_recursive(&self.segments, path)
    }

    fn matches_recursive(pattern: &[PatternSegment], path: &[String]) -> bool {
        match (pattern.first(), path.first()) {
            (None, None) => true,
            (None, Some(_)) => false,
            (Some(_), None) => pattern
                .iter()
                .all(|s| matches!(s, PatternSegment::DoubleWildcard)),
            (Some(seg), Some(path_seg)) => match seg {
                PatternSegment::Literal(lit) => {
                    lit == path_seg && Self::matches_recursive(&pattern[1..], &path[1..])
                }
                PatternSegment::SingleWildcard => {
                    Self::matches_recursive(&pattern[1..], &path[1..])
                }
                PatternSegment::DoubleWildcard => {
                    Self::matches_recursive(&pattern[1..], path)
                        || Self::matches_recursive(pattern, &path[1..])
                }
            },
        }
    }
}

/// Configuration for filtering reports.
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    /// Patterns for paths to drop
    pub ignore_patterns: Vec<PathPattern>,
    /// Patterns for paths to keep (if non-empty, only these are kept)
    pub only_patterns: Vec<PathPattern>,
}

impl FilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.ignore_patterns.push(PathPattern::parse(pattern));
        self
    }

    pub fn only(mut self, pattern: &str) -> Self {
        self.only_patterns.push(PathPattern::parse(pattern));
        self
    }

    pub fn has_filters(&self) -> bool {
        !self.ignore_patterns.is_empty() || !self.only_patterns.is_empty()
    }

    pub fn should_include(&self, path: &[String]) -> bool {
        if self.ignore_patterns.iter().any(|p| p.matches(path)) {
            return false;
        }

        self.only_patterns.is_empty() || self.only_patterns.iter().any(|p| p.matches(path))
    }
}

/// Keeps the diffs of `report` whose path passes `config`.
pub fn filter_report(report: Report, config: &FilterConfig) -> Report {
    if !config.has_filters() {
        return report;
    }

    let before = report.diffs.len();
    let diffs: Vec<_> = report
        .diffs
        .into_iter()
        .filter(|diff| config.should_include(&diff.path.tokens()))
        .collect();
    debug!(kept = diffs.len(), dropped = before - diffs.len(), "filtered report");

    Report { diffs, ..report }
}
