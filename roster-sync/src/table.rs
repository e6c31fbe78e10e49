use std::collections::HashMap;

use crate::row::{CandidateRecord, Flags, RowKey};
use crate::schema::RawTable;

/// Ordered roster of candidates in canonical shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateTable {
    rows: Vec<CandidateRecord>,
}

impl CandidateTable {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Builds a table from records that are already canonical. Use
    /// [`crate::normalize`] for anything read from outside.
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

    pub fn iter(&self) -> impl Iterator<Item = &CandidateRecord> {
        self.rows.iter()
    }

    pub fn get(&self, index: usize) -> Option<&CandidateRecord> {
        self.rows.get(index)
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [CandidateRecord] {
        &mut self.rows
    }

    pub fn flags_by_key(&self) -> HashMap<RowKey, Flags> {
        self.rows.iter().map(|r| (r.key(), r.flags)).collect()
    }

    pub fn find(&self, key: &RowKey) -> Option<&CandidateRecord> {
        self.rows.iter().find(|r| &r.key() == key)
    }

    /// Rows whose first or last name contains `query`, case-insensitively.
    /// A blank query keeps every row. The receiver is never modified.
    pub fn search(&self, query: &str) -> CandidateTable {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.clone();
        }
        let rows = self
            .rows
            .iter()
            .filter(|r| r.matches_name(&needle))
            .cloned()
            .collect();
        CandidateTable { rows }
    }

    /// String form with flags spelled `1`/`0`, the same cells the CSV codec writes.
    pub fn to_raw(&self) -> RawTable {
        let headers = crate::row::COLUMNS.iter().map(|c| c.to_string()).collect();
        let rows = self
            .rows
            .iter()
            .map(|r| {
                let mut cells = vec![r.first_name.clone(), r.last_name.clone(), r.file_url.clone()];
                cells.extend(r.flags.iter().map(|(_, on)| flag_cell(on).to_string()));
                cells
            })
            .collect();
        RawTable { headers, rows }
    }
}

pub(crate) fn flag_cell(on: bool) -> &'static str {
    if on {
        "1"
    } else {
        "0"
    }
}

impl FromIterator<CandidateRecord> for CandidateTable {
    fn from_iter<I: IntoIterator<Item = CandidateRecord>>(iter: I) -> Self {
        Self { rows: iter.into_iter().collect() }
    }
}

impl<'a> IntoIterator for &'a CandidateTable {
    type Item = &'a CandidateRecord;
    type IntoIter = std::slice::Iter<'a, CandidateRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
