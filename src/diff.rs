//! Structural comparison of document streams.
//!
//! [`compare_input_files`] walks two streams document by document and
//! produces a [`Report`]: the inputs plus an ordered list of [`Diff`]s, each
//! holding one or more [`Detail`]s at a [`Path`].
//!
//! Mapping keys are matched by name. Sequences are correlated by the list
//! heuristics in [`crate::list`]. A parent's own additions and removals are
//! reported before the changes found inside its children.
//!
//! # Examples
//!
//! ```
//! use docdiff::{compare_input_files, parse_yaml, CompareSettings, DetailKind, DocumentStream};
//!
//! let from = DocumentStream::new("old.yaml", parse_yaml("a: 1").unwrap());
//! let to = DocumentStream::new("new.yaml", parse_yaml("a: 1\nb: 2").unwrap());
//!
//! let report = compare_input_files(from, to, &CompareSettings::default()).unwrap();
//! assert_eq!(report.diffs.len(), 1);
//! assert_eq!(report.diffs[0].details[0].kind, DetailKind::Addition);
//! ```

use crate::config::CompareSettings;
use crate::error::CompareError;
use crate::path::Path;
use crate::tree::{Anchors, DocumentStream, Node, NodeKind, Tag, MAX_DEPTH};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// The kind of an atomic change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailKind {
    /// Entries exist in `to` but not in `from`.
    Addition,
    /// Entries exist in `from` but not in `to`.
    Removal,
    /// The value at the path was replaced.
    Modification,
    /// The same entries appear in a different order.
    OrderChange,
}

impl DetailKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailKind::Addition => "ADDITION",
            DetailKind::Removal => "REMOVAL",
            DetailKind::Modification => "MODIFICATION",
            DetailKind::OrderChange => "ORDERCHANGE",
        }
    }
}

impl fmt::Display for DetailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One atomic change. `from` is `None` for additions, `to` for removals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detail {
    pub kind: DetailKind,
    pub from: Option<Node>,
    pub to: Option<Node>,
}

impl Detail {
    pub fn addition(to: Node) -> Self {
        Self {
            kind: DetailKind::Addition,
            from: None,
            to: Some(to),
        }
    }

    pub fn removal(from: Node) -> Self {
        Self {
            kind: DetailKind::Removal,
            from: Some(from),
            to: None,
        }
    }

    pub fn modification(from: Option<Node>, to: Option<Node>) -> Self {
        Self {
            kind: DetailKind::Modification,
            from,
            to,
        }
    }

    pub fn order_change(from: Node, to: Node) -> Self {
        Self {
            kind: DetailKind::OrderChange,
            from: Some(from),
            to: Some(to),
        }
    }
}

/// All details found at one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    pub path: Path,
    pub details: Vec<Detail>,
}

impl Diff {
    pub fn new(path: Path, details: Vec<Detail>) -> Self {
        Self { path, details }
    }
}

/// Detail counts of a report, by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportStats {
    pub additions: usize,
    pub removals: usize,
    pub modifications: usize,
    pub order_changes: usize,
}

impl ReportStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: DetailKind) {
        match kind {
            DetailKind::Addition => self.additions += 1,
            DetailKind::Removal => self.removals += 1,
            DetailKind::Modification => self.modifications += 1,
            DetailKind::OrderChange => self.order_changes += 1,
        }
    }

    pub fn total_changes(&self) -> usize {
        self.additions + self.removals + self.modifications + self.order_changes
    }

    pub fn is_empty(&self) -> bool {
        self.total_changes() == 0
    }
}

/// The outcome of a comparison: both inputs and the differences between them.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub from: DocumentStream,
    pub to: DocumentStream,
    pub diffs: Vec<Diff>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diffs.len()
    }

    pub fn stats(&self) -> ReportStats {
        let mut stats = ReportStats::new();
        for detail in self.diffs.iter().flat_map(|diff| &diff.details) {
            stats.record(detail.kind);
        }
        stats
    }

    /// Finds the diff at the given rendered path, in any document.
    pub fn find(&self, path: &str) -> Option<&Diff> {
        self.diffs.iter().find(|diff| diff.path.to_string() == path)
    }
}

/// Compares two document streams.
///
/// Both streams must hold the same number of documents; documents are paired
/// by position.
///
/// # Errors
///
/// - [`CompareError::DocumentCountMismatch`] when the document counts differ
/// - [`CompareError::UnsupportedNode`] for a document nested below a root
/// - alias and depth errors for dangling or cyclic aliases
pub fn compare_input_files(
    from: DocumentStream,
    to: DocumentStream,
    settings: &CompareSettings,
) -> Result<Report, CompareError> {
    if from.len() != to.len() {
        return Err(CompareError::DocumentCountMismatch {
            from_location: from.location.clone(),
            from_count: from.len(),
            to_location: to.location.clone(),
            to_count: to.len(),
        });
    }

    debug!(
        from = %from.location,
        to = %to.location,
        documents = from.len(),
        "comparing document streams"
    );

    let comparator = Comparator::new(settings, &from.anchors, &to.anchors);
    let mut diffs = Vec::new();
    for (index, (a, b)) in from.documents.iter().zip(&to.documents).enumerate() {
        diffs.extend(comparator.objects(&Path::root(index), Some(a), Some(b))?);
    }

    debug!(diffs = diffs.len(), "comparison finished");
    Ok(Report { from, to, diffs })
}

/// Compares two alias-free nodes as the first document of a stream.
pub fn compare_nodes(
    from: &Node,
    to: &Node,
    settings: &CompareSettings,
) -> Result<Vec<Diff>, CompareError> {
    let anchors = Anchors::new();
    Comparator::new(settings, &anchors, &anchors).objects(&Path::root(0), Some(from), Some(to))
}

/// Recursive walker over a pair of trees. Each side resolves aliases
/// through its own arena.
pub(crate) struct Comparator<'a> {
    pub(crate) settings: &'a CompareSettings,
    pub(crate) from: &'a Anchors,
    pub(crate) to: &'a Anchors,
}

impl<'a> Comparator<'a> {
    pub(crate) fn new(settings: &'a CompareSettings, from: &'a Anchors, to: &'a Anchors) -> Self {
        Self { settings, from, to }
    }

    pub(crate) fn objects(
        &self,
        path: &Path,
        from: Option<&Node>,
        to: Option<&Node>,
    ) -> Result<Vec<Diff>, CompareError> {
        if path.depth() > MAX_DEPTH {
            return Err(CompareError::DepthExceeded { limit: MAX_DEPTH });
        }

        let from = from.map(|node| self.from.resolve(node)).transpose()?;
        let to = to.map(|node| self.to.resolve(node)).transpose()?;

        match (from, to) {
            (None, None) => Ok(Vec::new()),
            (Some(_), None) | (None, Some(_)) => {
                let from = from.map(|node| self.from.materialize(node)).transpose()?;
                let to = to.map(|node| self.to.materialize(node)).transpose()?;
                Ok(vec![Diff::new(
                    path.clone(),
                    vec![Detail::modification(from, to)],
                )])
            }
            (Some(from), Some(to)) => self.nodes(path, from, to),
        }
    }

    fn nodes(&self, path: &Path, from: &Node, to: &Node) -> Result<Vec<Diff>, CompareError> {
        if from.kind() != to.kind() || from.tag() != to.tag() {
            return Ok(vec![self.modification(path, from, to)?]);
        }

        match (from, to) {
            (Node::Document(from_root), Node::Document(to_root)) => {
                if !path.is_root() {
                    return Err(CompareError::UnsupportedNode {
                        path: path.to_string(),
                        kind: NodeKind::Document.to_string(),
                    });
                }
                self.objects(path, from_root.as_deref(), to_root.as_deref())
            }
            (Node::Mapping { entries: a, .. }, Node::Mapping { entries: b, .. }) => {
                self.mappings(path, a, b)
            }
            (Node::Sequence { items: a, .. }, Node::Sequence { items: b, .. }) => {
                self.sequences(path, a, b)
            }
            (Node::Scalar { .. }, Node::Scalar { .. }) => self.scalars(path, from, to),
            _ => Err(CompareError::UnsupportedNode {
                path: path.to_string(),
                kind: from.kind().to_string(),
            }),
        }
    }

    fn mappings(
        &self,
        path: &Path,
        from: &[(String, Node)],
        to: &[(String, Node)],
    ) -> Result<Vec<Diff>, CompareError> {
        let from_keys: HashMap<&str, &Node> = from.iter().map(|(k, v)| (k.as_str(), v)).collect();
        let to_keys: HashMap<&str, &Node> = to.iter().map(|(k, v)| (k.as_str(), v)).collect();

        let mut diffs = Vec::new();
        let mut removals = Vec::new();
        for (key, from_value) in from {
            let child = path.key(key.as_str());
            match to_keys.get(key.as_str()) {
                Some(to_value) => {
                    diffs.extend(self.objects(&child, Some(from_value), Some(*to_value))?)
                }
                None => {
                    if !self.settings.ignores_removal(&child.to_string()) {
                        removals.push((key.clone(), self.from.materialize(from_value)?));
                    }
                }
            }
        }

        let mut additions = Vec::new();
        for (key, to_value) in to {
            if from_keys.contains_key(key.as_str()) {
                continue;
            }
            let child = path.key(key.as_str());
            if !self.settings.ignores_addition(&child.to_string()) {
                additions.push((key.clone(), self.to.materialize(to_value)?));
            }
        }

        let mut details = Vec::new();
        if !removals.is_empty() {
            details.push(Detail::removal(Node::mapping(removals)));
        }
        if !additions.is_empty() {
            details.push(Detail::addition(Node::mapping(additions)));
        }

        Ok(prepend(path, details, diffs))
    }

    fn scalars(&self, path: &Path, from: &Node, to: &Node) -> Result<Vec<Diff>, CompareError> {
        let equal = match (from, to) {
            (Node::Scalar { tag: Tag::Null, .. }, Node::Scalar { tag: Tag::Null, .. }) => true,
            (
                Node::Scalar {
                    tag: Tag::Str,
                    value: a,
                },
                Node::Scalar {
                    tag: Tag::Str,
                    value: b,
                },
            ) => self.strings_equal(path, a, b),
            (Node::Scalar { value: a, .. }, Node::Scalar { value: b, .. }) => a == b,
            _ => false,
        };

        if equal {
            Ok(Vec::new())
        } else {
            Ok(vec![self.modification(path, from, to)?])
        }
    }

    fn strings_equal(&self, path: &Path, a: &str, b: &str) -> bool {
        if self.settings.comparators.is_empty() {
            return a == b;
        }
        match self.settings.comparators.get(&path.to_string()) {
            Some(comparator) => comparator.as_ref()(a, b),
            None => a == b,
        }
    }

    /// A single modification detail carrying alias-free copies of both sides.
    pub(crate) fn modification(
        &self,
        path: &Path,
        from: &Node,
        to: &Node,
    ) -> Result<Diff, CompareError> {
        Ok(Diff::new(
            path.clone(),
            vec![Detail::modification(
                Some(self.from.materialize(from)?),
                Some(self.to.materialize(to)?),
            )],
        ))
    }
}

/// Places a diff holding `details` at `path` in front of the child diffs.
pub(crate) fn prepend(path: &Path, details: Vec<Detail>, children: Vec<Diff>) -> Vec<Diff> {
    if details.is_empty() {
        return children;
    }
    let mut result = Vec::with_capacity(children.len() + 1);
    result.push(Diff::new(path.clone(), details));
    result.extend(children);
    result
}
