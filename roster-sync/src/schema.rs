//! Coercion of arbitrary tabular input into the canonical roster shape.
//!
//! Nothing here fails: missing columns get defaults, unknown flag spellings
//! read as `false`, extra columns are dropped and duplicate identities are
//! collapsed onto their first occurrence.

use std::collections::HashSet;

use tracing::warn;

use crate::row::{CandidateRecord, Flag, Flags, FILE_NAME, FIRST_NAME, KEY_SEPARATOR, LAST_NAME};
use crate::table::CandidateTable;

/// Untyped table as it comes off the wire: a header row and string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub rows_in: usize,
    pub duplicates_dropped: usize,
}

pub fn normalize(raw: &RawTable) -> CandidateTable {
    normalize_with_report(raw).0
}

pub fn normalize_with_report(raw: &RawTable) -> (CandidateTable, NormalizeReport) {
    let first = raw.column_index(FIRST_NAME);
    let last = raw.column_index(LAST_NAME);
    let file = raw.column_index(FILE_NAME);
    let flags: Vec<(Flag, Option<usize>)> = Flag::ALL
        .into_iter()
        .map(|flag| (flag, raw.column_index(flag.column())))
        .collect();

    let mut report = NormalizeReport { rows_in: raw.rows.len(), duplicates_dropped: 0 };
    let mut seen = HashSet::with_capacity(raw.rows.len());
    let mut records = Vec::with_capacity(raw.rows.len());

    for row in &raw.rows {
        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).map(String::as_str);

        let mut record = CandidateRecord {
            first_name: identity_field(cell(first)),
            last_name: identity_field(cell(last)),
            file_url: identity_field(cell(file)),
            flags: Flags::default(),
        };
        for (flag, idx) in &flags {
            record.flags.set(*flag, cell(*idx).map(parse_flag).unwrap_or(false));
        }

        if !seen.insert(record.key()) {
            warn!(
                first_name = %record.first_name,
                last_name = %record.last_name,
                file = %record.file_url,
                "dropping duplicate candidate row"
            );
            report.duplicates_dropped += 1;
            continue;
        }
        records.push(record);
    }

    (CandidateTable::from_records(records), report)
}

fn identity_field(value: Option<&str>) -> String {
    match value {
        Some(v) => v.chars().filter(|c| *c != KEY_SEPARATOR).collect(),
        None => String::new(),
    }
}

/// Flag cell vocabulary. Anything unrecognised, including blanks, is `false`.
pub fn parse_flag(value: &str) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "1.0" | "yes" | "y" => true,
        "false" | "0" | "0.0" | "no" | "n" => false,
        _ => false,
    }
}
