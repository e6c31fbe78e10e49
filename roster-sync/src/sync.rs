use std::collections::HashMap;

use crate::row::{CandidateRecord, Flags, RowKey};
use crate::table::CandidateTable;

/// Flags of every known row, keyed by identity, as of the last successful
/// write. Never mutated in place; advancing produces a new snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    flags: HashMap<RowKey, Flags>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn capture(table: &CandidateTable) -> Self {
        Self { flags: table.flags_by_key() }
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn get(&self, key: &RowKey) -> Option<Flags> {
        self.flags.get(key).copied()
    }

    /// New baseline with `view`'s flags laid over this one. Keys outside the
    /// view keep their previous flags.
    pub fn advanced(&self, view: &CandidateTable) -> Snapshot {
        let mut flags = self.flags.clone();
        flags.extend(view.iter().map(|r| (r.key(), r.flags)));
        Snapshot { flags }
    }
}

/// Rows of an edited view whose flags differ from the baseline, in view order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedRows {
    rows: Vec<CandidateRecord>,
}

impl ChangedRows {
    pub fn from_records(rows: Vec<CandidateRecord>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[CandidateRecord] {
        &self.rows
    }

    pub fn flags_by_key(&self) -> HashMap<RowKey, Flags> {
        self.rows.iter().map(|r| (r.key(), r.flags)).collect()
    }
}

/// A row is changed when any flag differs from the baseline for its key, or
/// when the baseline has never seen the key. An empty baseline yields no
/// changes: the first draw establishes it instead.
pub fn diff(previous: &Snapshot, current: &CandidateTable) -> ChangedRows {
    if previous.is_empty() {
        return ChangedRows::default();
    }
    let rows = current
        .iter()
        .filter(|r| previous.get(&r.key()) != Some(r.flags))
        .cloned()
        .collect();
    ChangedRows { rows }
}
