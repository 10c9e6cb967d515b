//! Pre-comparison normalization.
//!
//! A [`Normalizer`] edits a document in place before it is compared. The
//! provided [`IgnoreNormalizer`] strips fields that are known to be noise,
//! such as annotations injected by a cluster, addressed by JSON pointers and
//! scoped to the resources they apply to.
//!
//! Normalization is best effort: a removal that cannot be applied is logged
//! and skipped, never returned as an error.
//!
//! # Examples
//!
//! ```
//! use docdiff::normalize::{IgnoreNormalizer, Normalizer};
//! use docdiff::parse_yaml;
//!
//! let normalizer = IgnoreNormalizer::from_paths(["/metadata/generation"]).unwrap();
//! let mut document = parse_yaml("metadata:\n  name: web\n  generation: 4\n")
//!     .unwrap()
//!     .remove(0);
//! normalizer.normalize(&mut document).unwrap();
//! assert_eq!(document.scalar_at(&["metadata", "generation"]), None);
//! ```

use crate::config::NormalizeRule;
use crate::error::NormalizeError;
use crate::path::unescape_token;
use crate::tree::{DocumentStream, Node, NodeKind};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Rewrites a document before comparison.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, document: &mut Node) -> Result<(), NormalizeError>;
}

/// Runs `normalizer` over every document of `stream`.
pub fn normalize_stream(
    normalizer: &dyn Normalizer,
    stream: &mut DocumentStream,
) -> Result<(), NormalizeError> {
    debug!(location = %stream.location, documents = stream.len(), "normalizing stream");
    for document in &mut stream.documents {
        normalizer.normalize(document)?;
    }
    Ok(())
}

/// An RFC 6901 JSON pointer such as `/metadata/annotations/foo~1bar`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPointer {
    raw: String,
    tokens: Vec<String>,
}

impl JsonPointer {
    /// Parses a pointer. The empty pointer would remove the whole document
    /// and is rejected.
    pub fn parse(pointer: &str) -> Result<Self, NormalizeError> {
        if pointer.is_empty() {
            return Err(NormalizeError::invalid_pointer(
                pointer,
                "the empty pointer addresses the whole document",
            ));
        }
        let Some(rest) = pointer.strip_prefix('/') else {
            return Err(NormalizeError::invalid_pointer(pointer, "must start with '/'"));
        };

        let mut tokens = Vec::new();
        for raw in rest.split('/') {
            let mut chars = raw.chars();
            while let Some(c) = chars.next() {
                if c == '~' && !matches!(chars.next(), Some('0') | Some('1')) {
                    return Err(NormalizeError::invalid_pointer(
                        pointer,
                        "'~' must be followed by '0' or '1'",
                    ));
                }
            }
            tokens.push(unescape_token(raw));
        }

        Ok(Self {
            raw: pointer.to_string(),
            tokens,
        })
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Removes the addressed node from `document` and returns it.
    fn remove(&self, document: &mut Node) -> Result<Node, RemoveFailure> {
        let Some((last, parents)) = self.tokens.split_last() else {
            return Err(RemoveFailure::Missing(String::new()));
        };

        let mut current = match document {
            Node::Document(Some(root)) => root.as_mut(),
            Node::Document(None) => return Err(RemoveFailure::Missing(last.clone())),
            other => other,
        };
        for token in parents {
            current = match current {
                Node::Mapping { entries, .. } => entries
                    .iter_mut()
                    .find(|(key, _)| key == token)
                    .map(|(_, value)| value),
                Node::Sequence { items, .. } => {
                    token.parse::<usize>().ok().and_then(|i| items.get_mut(i))
                }
                other => return Err(RemoveFailure::Traversal(other.kind())),
            }
            .ok_or_else(|| RemoveFailure::Missing(token.clone()))?;
        }

        match current {
            Node::Mapping { entries, .. } => {
                let position = entries
                    .iter()
                    .position(|(key, _)| key == last)
                    .ok_or_else(|| RemoveFailure::Missing(last.clone()))?;
                Ok(entries.remove(position).1)
            }
            Node::Sequence { items, .. } => match last.parse::<usize>() {
                Ok(index) if index < items.len() => Ok(items.remove(index)),
                _ => Err(RemoveFailure::Missing(last.clone())),
            },
            other => Err(RemoveFailure::Traversal(other.kind())),
        }
    }
}

impl FromStr for JsonPointer {
    type Err = NormalizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

enum RemoveFailure {
    Missing(String),
    Traversal(NodeKind),
}

/// Selects documents by resource identity. `None` and `"*"` match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceFilter {
    pub group: Option<String>,
    pub kind: Option<String>,
    pub namespace: Option<String>,
    pub name: Option<String>,
}

impl ResourceFilter {
    /// A filter that matches every document.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Matches against the document's apiVersion group, kind,
    /// metadata.namespace and metadata.name.
    pub fn matches(&self, document: &Node) -> bool {
        let group = document
            .scalar_at(&["apiVersion"])
            .and_then(|api_version| api_version.rsplit_once('/'))
            .map_or("", |(group, _)| group);

        field_matches(&self.group, Some(group))
            && field_matches(&self.kind, document.scalar_at(&["kind"]))
            && field_matches(&self.namespace, document.scalar_at(&["metadata", "namespace"]))
            && field_matches(&self.name, document.scalar_at(&["metadata", "name"]))
    }
}

fn field_matches(expected: &Option<String>, actual: Option<&str>) -> bool {
    match expected.as_deref() {
        None | Some("*") => true,
        Some(expected) => actual == Some(expected),
    }
}

/// One scoped removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRule {
    pub filter: ResourceFilter,
    pub pointer: JsonPointer,
}

impl IgnoreRule {
    pub fn new(filter: ResourceFilter, pointer: JsonPointer) -> Self {
        Self { filter, pointer }
    }
}

/// Removes JSON-pointer addressed fields from matching documents.
#[derive(Debug, Clone, Default)]
pub struct IgnoreNormalizer {
    rules: Vec<IgnoreRule>,
}

impl IgnoreNormalizer {
    pub fn new(rules: Vec<IgnoreRule>) -> Self {
        Self { rules }
    }

    /// Removes each path from every document.
    ///
    /// # Errors
    ///
    /// Fails on the first path that is not a valid JSON pointer.
    pub fn from_paths<I, S>(paths: I) -> Result<Self, NormalizeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = paths
            .into_iter()
            .map(|path| {
                Ok(IgnoreRule::new(
                    ResourceFilter::any(),
                    JsonPointer::parse(path.as_ref())?,
                ))
            })
            .collect::<Result<Vec<_>, NormalizeError>>()?;
        Ok(Self::new(rules))
    }

    /// Builds rules from the `[[normalize]]` tables of a config file.
    pub fn from_config_rules(rules: &[NormalizeRule]) -> Result<Self, NormalizeError> {
        let mut compiled = Vec::new();
        for rule in rules {
            let filter = ResourceFilter {
                group: rule.group.clone(),
                kind: rule.kind.clone(),
                namespace: rule.namespace.clone(),
                name: rule.name.clone(),
            };
            for path in &rule.paths {
                compiled.push(IgnoreRule::new(filter.clone(), JsonPointer::parse(path)?));
            }
        }
        Ok(Self::new(compiled))
    }

    /// Appends the rules of `other`.
    pub fn merge(mut self, other: IgnoreNormalizer) -> Self {
        self.rules.extend(other.rules);
        self
    }

    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Normalizer for IgnoreNormalizer {
    fn normalize(&self, document: &mut Node) -> Result<(), NormalizeError> {
        // Scope is decided before any removal, so a rule that strips metadata
        // cannot change which later rules apply.
        let matching: Vec<&IgnoreRule> = self
            .rules
            .iter()
            .filter(|rule| rule.filter.matches(document))
            .collect();

        for rule in matching {
            match rule.pointer.remove(document) {
                Ok(_) => debug!(pointer = %rule.pointer, "removed field"),
                Err(RemoveFailure::Missing(token)) => {
                    warn!(pointer = %rule.pointer, missing = %token, "nothing to remove")
                }
                Err(RemoveFailure::Traversal(kind)) => {
                    warn!(pointer = %rule.pointer, kind = %kind, "skipping removal through a non-container node")
                }
            }
        }
        Ok(())
    }
}
