//! Source id → target id remapping
//!
//! With a prefix `P`, ids already shaped `P_<n>` keep their value and reserve
//! `n`; every other id receives the lowest unused positive sequence number,
//! handed out in the order the ids were given (fetch order). Without a
//! prefix the mapping is the identity.

use std::collections::{HashMap, HashSet};

use regex::Regex;

use crate::record::FetchedRecord;

/// Total mapping from every source id of one export to its target id
#[derive(Debug, Clone, Default)]
pub struct IdentifierMap {
    /// (source, target) in insertion order
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl IdentifierMap {
    /// Compute the mapping for `ids`, which must be in fetch order.
    ///
    /// Duplicate ids are mapped once, at their first position.
    pub fn compute<S: AsRef<str>>(ids: &[S], prefix: Option<&str>) -> Self {
        let mut map = IdentifierMap::default();

        let prefix = match prefix.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => p,
            None => {
                for id in ids {
                    map.insert(id.as_ref(), id.as_ref().to_string());
                }
                return map;
            }
        };

        let namespace = format!("{}_", prefix);
        let conforming = conforming_pattern(&namespace);

        // Pass 1: reserve the sequence numbers of already conforming ids
        let mut used: HashSet<u64> = HashSet::new();
        let mut preserved: HashSet<&str> = HashSet::new();
        for id in ids {
            let id = id.as_ref();
            if let Some(n) = sequence_of(conforming.as_ref(), id) {
                used.insert(n);
                preserved.insert(id);
            }
        }

        // Pass 2: fill the lowest gaps, in the order the ids were given
        let mut next: u64 = 1;
        for id in ids {
            let id = id.as_ref();
            if map.contains(id) {
                continue;
            }
            if preserved.contains(id) {
                map.insert(id, id.to_string());
                continue;
            }

            while used.contains(&next) {
                next += 1;
            }
            used.insert(next);
            map.insert(id, format!("{}{}", namespace, next));
            next += 1;
        }

        tracing::debug!(
            ids = map.len(),
            preserved = preserved.len(),
            prefix = %prefix,
            "computed identifier mapping"
        );

        map
    }

    /// Compute the mapping over the full id universe of an export: record
    /// ids in fetch order, then ids of reference objects in the order they
    /// are met while walking the same records.
    pub fn for_records(records: &[FetchedRecord], prefix: Option<&str>) -> Self {
        let mut universe: Vec<&str> = records.iter().filter_map(|r| r.id.as_deref()).collect();
        for record in records {
            universe.extend(record.reference_ids());
        }
        Self::compute(universe.as_slice(), prefix)
    }

    fn insert(&mut self, source: &str, target: String) {
        if self.index.contains_key(source) {
            return;
        }
        self.index.insert(source.to_string(), self.entries.len());
        self.entries.push((source.to_string(), target));
    }

    /// Target id for a source id, if the id is known
    pub fn get(&self, source: &str) -> Option<&str> {
        self.index
            .get(source)
            .map(|&i| self.entries[i].1.as_str())
    }

    /// Target id for a source id, falling back to the id itself
    pub fn target_of<'a>(&'a self, source: &'a str) -> &'a str {
        self.get(source).unwrap_or(source)
    }

    pub fn contains(&self, source: &str) -> bool {
        self.index.contains_key(source)
    }

    /// (source, target) pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(s, t)| (s.as_str(), t.as_str()))
    }

    /// Pairs whose target differs from the source
    pub fn changed(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(s, t)| s != t)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn conforming_pattern(namespace: &str) -> Option<Regex> {
    Regex::new(&format!(r"^{}(\d+)$", regex::escape(namespace))).ok()
}

/// Sequence number of a conforming id; suffixes that overflow `u64` are
/// non-conforming.
fn sequence_of(pattern: Option<&Regex>, id: &str) -> Option<u64> {
    pattern?
        .captures(id)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
}
