//! In-memory document model.
//!
//! A parsed input is a [`DocumentStream`]: a location label, the ordered list
//! of top-level documents, and the [`Anchors`] arena that alias nodes point
//! into. Nodes never own the target of an alias; they hold an [`AnchorId`]
//! and the arena resolves it.

use crate::error::CompareError;
use std::fmt;

/// Number of alias-to-alias hops followed before resolution gives up.
const MAX_ALIAS_HOPS: usize = 64;

/// Nesting limit for recursive walks over a tree.
pub(crate) const MAX_DEPTH: usize = 256;

/// Type marker carried by mapping, sequence and scalar nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Null,
    Bool,
    Int,
    Float,
    Str,
    Timestamp,
    Map,
    Seq,
    /// An explicit local tag such as `!Ref`.
    Custom(String),
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Null => f.write_str("!!null"),
            Tag::Bool => f.write_str("!!bool"),
            Tag::Int => f.write_str("!!int"),
            Tag::Float => f.write_str("!!float"),
            Tag::Str => f.write_str("!!str"),
            Tag::Timestamp => f.write_str("!!timestamp"),
            Tag::Map => f.write_str("!!map"),
            Tag::Seq => f.write_str("!!seq"),
            Tag::Custom(tag) => f.write_str(tag),
        }
    }
}

/// Discriminant of a [`Node`], used for kind checks and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Mapping,
    Sequence,
    Scalar,
    Alias,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Document => "document",
            NodeKind::Mapping => "mapping",
            NodeKind::Sequence => "sequence",
            NodeKind::Scalar => "scalar",
            NodeKind::Alias => "alias",
        };
        f.write_str(name)
    }
}

/// Handle of an anchored node inside an [`Anchors`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorId(usize);

impl AnchorId {
    #[cfg(test)]
    pub(crate) fn from_index(index: usize) -> Self {
        AnchorId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// A node of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A top-level document wrapping its root. Empty documents have no root.
    Document(Option<Box<Node>>),
    /// Key/value pairs in source order. Keys are compared by name only.
    Mapping { tag: Tag, entries: Vec<(String, Node)> },
    Sequence { tag: Tag, items: Vec<Node> },
    Scalar { tag: Tag, value: String },
    /// Reference to an anchored node of the same stream.
    Alias(AnchorId),
}

impl Node {
    pub fn document(root: Node) -> Self {
        Node::Document(Some(Box::new(root)))
    }

    pub fn empty_document() -> Self {
        Node::Document(None)
    }

    pub fn mapping<K: Into<String>>(entries: impl IntoIterator<Item = (K, Node)>) -> Self {
        Node::Mapping {
            tag: Tag::Map,
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn sequence(items: impl IntoIterator<Item = Node>) -> Self {
        Node::Sequence {
            tag: Tag::Seq,
            items: items.into_iter().collect(),
        }
    }

    pub fn scalar(tag: Tag, value: impl Into<String>) -> Self {
        Node::Scalar {
            tag,
            value: value.into(),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Node::scalar(Tag::Str, value)
    }

    pub fn int(value: i64) -> Self {
        Node::scalar(Tag::Int, value.to_string())
    }

    /// Whole floats keep a trailing `.0` so they never read as integers.
    pub fn float(value: f64) -> Self {
        let text = if value.is_finite() && value.fract() == 0.0 {
            format!("{:.1}", value)
        } else {
            value.to_string()
        };
        Node::scalar(Tag::Float, text)
    }

    pub fn bool(value: bool) -> Self {
        Node::scalar(Tag::Bool, value.to_string())
    }

    pub fn null() -> Self {
        Node::scalar(Tag::Null, "null")
    }

    pub fn alias(anchor: AnchorId) -> Self {
        Node::Alias(anchor)
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Document(_) => NodeKind::Document,
            Node::Mapping { .. } => NodeKind::Mapping,
            Node::Sequence { .. } => NodeKind::Sequence,
            Node::Scalar { .. } => NodeKind::Scalar,
            Node::Alias(_) => NodeKind::Alias,
        }
    }

    /// The node's tag. Documents and aliases carry none.
    pub fn tag(&self) -> Option<&Tag> {
        match self {
            Node::Mapping { tag, .. } | Node::Sequence { tag, .. } | Node::Scalar { tag, .. } => {
                Some(tag)
            }
            Node::Document(_) | Node::Alias(_) => None,
        }
    }

    /// Human-friendly type name, used when reporting type changes.
    pub fn type_name(&self) -> String {
        match self {
            Node::Document(_) => "document".to_string(),
            Node::Alias(_) => "alias".to_string(),
            Node::Mapping { .. } => "map".to_string(),
            Node::Sequence { .. } => "list".to_string(),
            Node::Scalar { tag, .. } => match tag {
                Tag::Null => "null".to_string(),
                Tag::Bool => "bool".to_string(),
                Tag::Int => "int".to_string(),
                Tag::Float => "float".to_string(),
                Tag::Str => "string".to_string(),
                Tag::Timestamp => "timestamp".to_string(),
                other => other.to_string(),
            },
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Scalar { tag: Tag::Null, .. })
    }

    /// The scalar value, if this is a scalar.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Node::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Looks up a mapping value by key. Non-mappings have no keys.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Mapping { entries, .. } => {
                entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        match self {
            Node::Mapping { entries, .. } => entries
                .iter_mut()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// The root of a document, or the node itself for non-documents.
    pub fn root(&self) -> Option<&Node> {
        match self {
            Node::Document(root) => root.as_deref(),
            other => Some(other),
        }
    }

    /// Follows `keys` through nested mappings and returns the scalar found there.
    pub fn scalar_at(&self, keys: &[&str]) -> Option<&str> {
        let mut current = self.root()?;
        for key in keys {
            current = current.get(key)?;
        }
        current.as_scalar()
    }

    /// Identity of a Kubernetes-style resource document, when it has one.
    pub fn resource_id(&self) -> Option<ResourceId> {
        let kind = self.scalar_at(&["kind"])?;
        let name = self.scalar_at(&["metadata", "name"])?;
        Some(ResourceId {
            api_version: self.scalar_at(&["apiVersion"]).unwrap_or_default().to_string(),
            kind: kind.to_string(),
            namespace: self
                .scalar_at(&["metadata", "namespace"])
                .map(str::to_string),
            name: name.to_string(),
        })
    }

    /// Returns a short preview of the node's value, truncated to max_len.
    pub fn preview(&self, max_len: usize) -> String {
        let preview = match self {
            Node::Document(None) => "(empty document)".to_string(),
            Node::Document(Some(root)) => return root.preview(max_len),
            Node::Alias(anchor) => format!("*anchor{}", anchor.index()),
            Node::Scalar {
                tag: Tag::Str,
                value,
            } => format!("\"{}\"", value),
            Node::Scalar { value, .. } => value.clone(),
            Node::Mapping { entries, .. } => match entries.len() {
                0 => "{}".to_string(),
                1 => "{ 1 key }".to_string(),
                n => format!("{{ {} keys }}", n),
            },
            Node::Sequence { items, .. } => match items.len() {
                0 => "[]".to_string(),
                1 => "[ 1 item ]".to_string(),
                n => format!("[ {} items ]", n),
            },
        };

        if preview.chars().count() > max_len {
            let kept: String = preview.chars().take(max_len.saturating_sub(3)).collect();
            format!("{}...", kept)
        } else {
            preview
        }
    }
}

/// Arena of anchored nodes that [`Node::Alias`] handles point into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Anchors {
    nodes: Vec<Node>,
}

impl Anchors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an anchored node and returns the handle aliases use to reach it.
    pub fn register(&mut self, node: Node) -> AnchorId {
        self.nodes.push(node);
        AnchorId(self.nodes.len() - 1)
    }

    pub fn get(&self, anchor: AnchorId) -> Option<&Node> {
        self.nodes.get(anchor.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Dereferences `node` until it is no longer an alias.
    pub fn resolve<'a>(&'a self, node: &'a Node) -> Result<&'a Node, CompareError> {
        let mut current = node;
        let mut hops = 0;
        while let Node::Alias(anchor) = current {
            hops += 1;
            if hops > MAX_ALIAS_HOPS {
                return Err(CompareError::AliasLoop {
                    anchor: anchor.index(),
                });
            }
            current = self.get(*anchor).ok_or(CompareError::DanglingAlias {
                anchor: anchor.index(),
            })?;
        }
        Ok(current)
    }

    /// Deep-copies `node` with every alias replaced by its target.
    pub fn materialize(&self, node: &Node) -> Result<Node, CompareError> {
        self.materialize_at(node, 0)
    }

    fn materialize_at(&self, node: &Node, depth: usize) -> Result<Node, CompareError> {
        if depth > MAX_DEPTH {
            return Err(CompareError::DepthExceeded { limit: MAX_DEPTH });
        }
        let node = self.resolve(node)?;
        Ok(match node {
            Node::Document(root) => match root {
                Some(root) => Node::document(self.materialize_at(root, depth + 1)?),
                None => Node::empty_document(),
            },
            Node::Mapping { tag, entries } => Node::Mapping {
                tag: tag.clone(),
                entries: entries
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), self.materialize_at(v, depth + 1)?)))
                    .collect::<Result<_, CompareError>>()?,
            },
            Node::Sequence { tag, items } => Node::Sequence {
                tag: tag.clone(),
                items: items
                    .iter()
                    .map(|item| self.materialize_at(item, depth + 1))
                    .collect::<Result<_, _>>()?,
            },
            scalar => scalar.clone(),
        })
    }
}

/// An ordered list of top-level documents read from one input source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentStream {
    /// Where the documents came from. Only used in messages and headers.
    pub location: String,
    pub documents: Vec<Node>,
    pub anchors: Anchors,
}

impl DocumentStream {
    pub fn new(location: impl Into<String>, documents: Vec<Node>) -> Self {
        Self {
            location: location.into(),
            documents,
            anchors: Anchors::new(),
        }
    }

    /// A stream holding a single document with the given root.
    pub fn single(location: impl Into<String>, root: Node) -> Self {
        Self::new(location, vec![Node::document(root)])
    }

    pub fn with_anchors(mut self, anchors: Anchors) -> Self {
        self.anchors = anchors;
        self
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// `apiVersion`/`kind`/`namespace`/`name` of a resource document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceId {
    pub api_version: String,
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
}

impl ResourceId {
    /// API group part of `apiVersion`; the core group is empty.
    pub fn group(&self) -> &str {
        match self.api_version.rsplit_once('/') {
            Some((group, _)) => group,
            None => "",
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.api_version.is_empty() {
            write!(f, "{}/", self.api_version)?;
        }
        write!(f, "{}/", self.kind)?;
        if let Some(namespace) = &self.namespace {
            write!(f, "{}/", namespace)?;
        }
        f.write_str(&self.name)
    }
}
