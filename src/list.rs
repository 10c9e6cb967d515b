//! Sequence correlation.
//!
//! Lists are either ordered values or keyed collections written as lists
//! (containers, ports, env vars). Before comparing, the list heuristics pick
//! one of three strategies, in this order:
//!
//! 1. a standard identifier (`name`, then `key`, then `id`) that every entry of
//!    both lists carries as a unique scalar;
//! 2. a guessed identifier: a string-valued key unique across both lists whose
//!    distinct value count exceeds the configured threshold;
//! 3. an unordered comparison of entry fingerprints.

use crate::diff::{prepend, Comparator, Detail, Diff};
use crate::error::CompareError;
use crate::hash::Fingerprint;
use crate::path::Path;
use crate::tree::{Anchors, Node, Tag};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Identifier keys tried before any guessing, in priority order.
pub const STANDARD_IDENTIFIERS: [&str; 3] = ["name", "key", "id"];

impl Comparator<'_> {
    pub(crate) fn sequences(
        &self,
        path: &Path,
        from: &[Node],
        to: &[Node],
    ) -> Result<Vec<Diff>, CompareError> {
        if from.is_empty() && to.is_empty() {
            return Ok(Vec::new());
        }

        let from = resolve_all(self.from, from)?;
        let to = resolve_all(self.to, to)?;

        match self.identifier(&from, &to) {
            Some(identifier) => {
                debug!(path = %path, identifier = %identifier, "correlating list entries by identifier");
                self.named_lists(path, &identifier, &from, &to)
            }
            None => self.simple_lists(path, &from, &to),
        }
    }

    fn identifier(&self, from: &[&Node], to: &[&Node]) -> Option<String> {
        STANDARD_IDENTIFIERS
            .iter()
            .find(|candidate| {
                is_unique_identifier(self.from, from, candidate)
                    && is_unique_identifier(self.to, to, candidate)
            })
            .map(|candidate| candidate.to_string())
            .or_else(|| self.guess_identifier(from, to))
    }

    /// Looks for a string-valued key that identifies every entry on both sides.
    /// Keys are tried in order of first appearance in `from`.
    fn guess_identifier(&self, from: &[&Node], to: &[&Node]) -> Option<String> {
        let threshold = self.settings.non_standard_identifier_guess_count_threshold;
        let from_values = DistinctValues::collect(self.from, from);
        let to_values = DistinctValues::collect(self.to, to);

        from_values
            .keys
            .iter()
            .find(|key| {
                let from_count = from_values.count(key);
                from_count == from.len()
                    && from_count > threshold
                    && to_values.count(key) == to.len()
            })
            .map(|key| key.to_string())
    }

    fn named_lists(
        &self,
        path: &Path,
        identifier: &str,
        from: &[&Node],
        to: &[&Node],
    ) -> Result<Vec<Diff>, CompareError> {
        let from_ids = identifier_values(path, self.from, from, identifier)?;
        let to_ids = identifier_values(path, self.to, to, identifier)?;
        let from_lookup: HashMap<&str, usize> =
            from_ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let to_lookup: HashMap<&str, usize> =
            to_ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let mut diffs = Vec::new();
        let mut removals = Vec::new();
        for (entry, id) in from.iter().zip(&from_ids) {
            match to_lookup.get(id) {
                Some(&index) => diffs.extend(self.objects(
                    &path.named(identifier, *id),
                    Some(*entry),
                    Some(to[index]),
                )?),
                None => removals.push(self.from.materialize(entry)?),
            }
        }

        let mut additions = Vec::new();
        for (entry, id) in to.iter().zip(&to_ids) {
            if !from_lookup.contains_key(id) {
                additions.push(self.to.materialize(entry)?);
            }
        }

        let mut details = Vec::new();
        if !self.settings.ignore_order_changes {
            let common_from: Vec<&str> = from_ids
                .iter()
                .copied()
                .filter(|id| to_lookup.contains_key(id))
                .collect();
            let common_to: Vec<&str> = to_ids
                .iter()
                .copied()
                .filter(|id| from_lookup.contains_key(id))
                .collect();
            if common_from != common_to {
                details.push(Detail::order_change(
                    Node::sequence(common_from.into_iter().map(Node::string)),
                    Node::sequence(common_to.into_iter().map(Node::string)),
                ));
            }
        }
        if !removals.is_empty() {
            details.push(Detail::removal(Node::sequence(removals)));
        }
        if !additions.is_empty() {
            details.push(Detail::addition(Node::sequence(additions)));
        }

        Ok(prepend(path, details, diffs))
    }

    /// Compares lists without identifiers. Entries match when their
    /// fingerprints match; matched entries are not compared further.
    ///
    /// An OrderChange here may also cover a change in how often an entry
    /// repeats (`[1, 1, 2]` to `[1, 2, 2]`), since no entry is added or removed.
    fn simple_lists(
        &self,
        path: &Path,
        from: &[&Node],
        to: &[&Node],
    ) -> Result<Vec<Diff>, CompareError> {
        if from.len() == 1 && to.len() == 1 {
            return self.objects(&path.index(0), Some(from[0]), Some(to[0]));
        }

        let from_prints = fingerprints(self.from, from)?;
        let to_prints = fingerprints(self.to, to)?;
        let from_lookup: HashSet<&Fingerprint> = from_prints.iter().collect();
        let to_lookup: HashSet<&Fingerprint> = to_prints.iter().collect();

        let removals = from
            .iter()
            .zip(&from_prints)
            .filter(|(_, print)| !to_lookup.contains(print))
            .map(|(entry, _)| self.from.materialize(entry))
            .collect::<Result<Vec<_>, _>>()?;
        let additions = to
            .iter()
            .zip(&to_prints)
            .filter(|(_, print)| !from_lookup.contains(print))
            .map(|(entry, _)| self.to.materialize(entry))
            .collect::<Result<Vec<_>, _>>()?;

        let mut details = Vec::new();
        if !self.settings.ignore_order_changes
            && removals.is_empty()
            && additions.is_empty()
            && from_prints != to_prints
        {
            details.push(Detail::order_change(
                materialize_all(self.from, from)?,
                materialize_all(self.to, to)?,
            ));
        }
        if !removals.is_empty() {
            details.push(Detail::removal(Node::sequence(removals)));
        }
        if !additions.is_empty() {
            details.push(Detail::addition(Node::sequence(additions)));
        }

        Ok(prepend(path, details, Vec::new()))
    }
}

fn resolve_all<'n>(anchors: &'n Anchors, items: &'n [Node]) -> Result<Vec<&'n Node>, CompareError> {
    items.iter().map(|item| anchors.resolve(item)).collect()
}

fn fingerprints(anchors: &Anchors, items: &[&Node]) -> Result<Vec<Fingerprint>, CompareError> {
    items
        .iter()
        .map(|item| Fingerprint::of(item, anchors))
        .collect()
}

fn materialize_all(anchors: &Anchors, items: &[&Node]) -> Result<Node, CompareError> {
    items
        .iter()
        .map(|item| anchors.materialize(item))
        .collect::<Result<Vec<_>, _>>()
        .map(Node::sequence)
}

/// The scalar stored under `key` in a mapping entry.
fn scalar_value<'n>(anchors: &'n Anchors, entry: &'n Node, key: &str) -> Option<&'n str> {
    anchors.resolve(entry.get(key)?).ok()?.as_scalar()
}

/// True when every entry carries `key` as a scalar and no two values repeat.
fn is_unique_identifier(anchors: &Anchors, list: &[&Node], key: &str) -> bool {
    let mut seen = HashSet::with_capacity(list.len());
    for entry in list {
        match scalar_value(anchors, entry, key) {
            Some(value) => {
                seen.insert(value);
            }
            None => return false,
        }
    }
    seen.len() == list.len()
}

fn identifier_values<'n>(
    path: &Path,
    anchors: &'n Anchors,
    list: &[&'n Node],
    identifier: &str,
) -> Result<Vec<&'n str>, CompareError> {
    list.iter()
        .map(|entry| {
            scalar_value(anchors, entry, identifier).ok_or_else(|| CompareError::MissingKey {
                path: path.to_string(),
                key: identifier.to_string(),
            })
        })
        .collect()
}

/// Distinct string values per string key over the mapping entries of a list.
struct DistinctValues<'n> {
    keys: Vec<&'n str>,
    values: HashMap<&'n str, HashSet<&'n str>>,
}

impl<'n> DistinctValues<'n> {
    fn collect(anchors: &'n Anchors, list: &[&'n Node]) -> Self {
        let mut keys = Vec::new();
        let mut values: HashMap<&'n str, HashSet<&'n str>> = HashMap::new();
        for entry in list {
            let Node::Mapping { entries, .. } = entry else {
                continue;
            };
            for (key, value) in entries {
                let Ok(Node::Scalar {
                    tag: Tag::Str,
                    value,
                }) = anchors.resolve(value)
                else {
                    continue;
                };
                values
                    .entry(key.as_str())
                    .or_insert_with(|| {
                        keys.push(key.as_str());
                        HashSet::new()
                    })
                    .insert(value.as_str());
            }
        }
        Self { keys, values }
    }

    fn count(&self, key: &str) -> usize {
        self.values.get(key).map_or(0, HashSet::len)
    }
}
