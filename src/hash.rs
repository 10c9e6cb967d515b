//! Structural fingerprints of subtrees.
//!
//! A [`Fingerprint`] is a canonical, hashable copy of a subtree: aliases are
//! resolved, mapping entries are sorted by key, and every null is the same
//! null. Two subtrees with equal fingerprints are treated as equal content
//! regardless of where they sit in their documents.

use crate::error::CompareError;
use crate::tree::{Anchors, Node, Tag, MAX_DEPTH};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Fingerprint {
    Null,
    Scalar { tag: String, value: String },
    Mapping(Vec<(String, Fingerprint)>),
    Sequence(Vec<Fingerprint>),
}

impl Fingerprint {
    /// Canonicalizes `node`, resolving aliases through `anchors`.
    pub fn of(node: &Node, anchors: &Anchors) -> Result<Self, CompareError> {
        Self::at_depth(node, anchors, 0)
    }

    fn at_depth(node: &Node, anchors: &Anchors, depth: usize) -> Result<Self, CompareError> {
        if depth > MAX_DEPTH {
            return Err(CompareError::DepthExceeded { limit: MAX_DEPTH });
        }

        match anchors.resolve(node)? {
            Node::Document(Some(root)) => Self::at_depth(root, anchors, depth + 1),
            Node::Document(None) => Ok(Fingerprint::Null),
            Node::Scalar { tag: Tag::Null, .. } => Ok(Fingerprint::Null),
            Node::Scalar { tag, value } => Ok(Fingerprint::Scalar {
                tag: tag.to_string(),
                value: value.clone(),
            }),
            Node::Mapping { entries, .. } => {
                let mut canonical = entries
                    .iter()
                    .map(|(key, value)| {
                        Ok((key.clone(), Self::at_depth(value, anchors, depth + 1)?))
                    })
                    .collect::<Result<Vec<_>, CompareError>>()?;
                canonical.sort_by(|a, b| a.0.cmp(&b.0));
                Ok(Fingerprint::Mapping(canonical))
            }
            Node::Sequence { items, .. } => items
                .iter()
                .map(|item| Self::at_depth(item, anchors, depth + 1))
                .collect::<Result<Vec<_>, _>>()
                .map(Fingerprint::Sequence),
            // resolve only returns once it reaches a non-alias node
            Node::Alias(anchor) => Err(CompareError::AliasLoop {
                anchor: anchor.index(),
            }),
        }
    }
}
