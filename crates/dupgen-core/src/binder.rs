//! Record handles and class grouping
//!
//! Every record with an id gets a symbolic handle (`Record_<n>`) that the
//! generated script uses to refer to it before the target platform has
//! assigned its own identity. Records are grouped by their own class name,
//! classes in first-seen order.

use std::collections::HashMap;
use std::fmt;

use crate::record::FetchedRecord;

/// Symbolic name bound to one record for the lifetime of one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordHandle(u32);

impl RecordHandle {
    /// Handle numbers start at 1
    pub fn number(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RecordHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record_{}", self.0)
    }
}

/// Bound records of one class, in fetch order
#[derive(Debug, Clone)]
pub struct ClassGroup<'a> {
    pub class_name: &'a str,
    pub records: Vec<&'a FetchedRecord>,
}

/// Result of binding one export's records
#[derive(Debug, Clone, Default)]
pub struct Bindings<'a> {
    handles: HashMap<&'a str, RecordHandle>,
    groups: Vec<ClassGroup<'a>>,
    /// Later copies of bound records, fetched again under another class
    repeats: HashMap<&'a str, Vec<&'a FetchedRecord>>,
    /// Records dropped for lacking an id
    pub skipped: usize,
    /// Records folded into an already bound record with the same id
    pub duplicates: usize,
}

impl<'a> Bindings<'a> {
    /// Bind `records` in one pass, in the given (fetch) order.
    pub fn bind<I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a FetchedRecord>,
    {
        let mut bindings = Bindings::default();
        let mut group_index: HashMap<&'a str, usize> = HashMap::new();
        let mut next: u32 = 1;

        for record in records {
            let Some(id) = record.id.as_deref() else {
                tracing::warn!(
                    class = %record.class_name,
                    name = record.display_name(),
                    "record has no id, excluded from export"
                );
                bindings.skipped += 1;
                continue;
            };

            if bindings.handles.contains_key(id) {
                tracing::debug!(
                    id,
                    class = %record.requested_class,
                    "record fetched again, merged into first copy"
                );
                bindings.repeats.entry(id).or_default().push(record);
                bindings.duplicates += 1;
                continue;
            }

            bindings.handles.insert(id, RecordHandle(next));
            next += 1;

            let slot = *group_index
                .entry(record.class_name.as_str())
                .or_insert_with(|| {
                    bindings.groups.push(ClassGroup {
                        class_name: record.class_name.as_str(),
                        records: Vec::new(),
                    });
                    bindings.groups.len() - 1
                });
            bindings.groups[slot].records.push(record);
        }

        bindings
    }

    /// Handle bound to a source id
    pub fn handle(&self, id: &str) -> Option<RecordHandle> {
        self.handles.get(id).copied()
    }

    /// A bound record followed by every later copy of it, in fetch order
    pub fn copies(&self, record: &'a FetchedRecord) -> Vec<&'a FetchedRecord> {
        let mut copies = vec![record];
        if let Some(repeats) = record.id.as_deref().and_then(|id| self.repeats.get(id)) {
            copies.extend(repeats.iter().copied());
        }
        copies
    }

    /// Classes in first-seen order
    pub fn groups(&self) -> &[ClassGroup<'a>] {
        &self.groups
    }

    /// Number of bound records
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
