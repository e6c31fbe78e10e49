use crate::sync::ChangedRows;
use crate::table::CandidateTable;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Rows whose flags were overwritten by an incoming value.
    pub updated: usize,
    /// Incoming rows that matched but carried the flags already stored.
    pub skipped: usize,
    /// Incoming rows with no counterpart in the authoritative table.
    pub unmatched: usize,
}

/// Right-biased merge: every changed row's flags replace the authoritative
/// value for the same identity key. Identity columns and row order are kept
/// from `authoritative`.
pub fn merge_flags(authoritative: &CandidateTable, changed: &ChangedRows) -> (CandidateTable, MergeReport) {
    let incoming = changed.flags_by_key();
    let mut report = MergeReport::default();
    let mut merged = authoritative.clone();
    let mut matched = 0;

    for record in merged.rows_mut() {
        let Some(flags) = incoming.get(&record.key()) else {
            continue;
        };
        matched += 1;
        if record.flags == *flags {
            report.skipped += 1;
        } else {
            record.flags = *flags;
            report.updated += 1;
        }
    }
    report.unmatched = incoming.len().saturating_sub(matched);

    (merged, report)
}
