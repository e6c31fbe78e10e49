//! Editable grid state: the flag edits the user has made on top of the
//! authoritative roster, keyed by row identity so they survive filtering.

use std::collections::HashMap;
use std::fmt::Write as _;

use roster_sync::{CandidateRecord, CandidateTable, Flag, Flags, RowKey};

use super::theme::{self, Theme};

#[derive(Debug, Clone, Default)]
pub struct Grid {
    edits: HashMap<RowKey, Flags>,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.edits.len()
    }

    pub fn is_edited(&self, key: &RowKey) -> bool {
        self.edits.contains_key(key)
    }

    /// `base` with every overlay edit applied; what the user currently sees.
    pub fn edited_view(&self, base: &CandidateTable) -> CandidateTable {
        base.iter()
            .map(|r| match self.edits.get(&r.key()) {
                Some(flags) => r.clone().with_flags(*flags),
                None => r.clone(),
            })
            .collect()
    }

    /// Flips `flag` on the 1-based `row` of `view`. Returns the edited record.
    pub fn toggle(&mut self, view: &CandidateTable, row: usize, flag: Flag) -> Option<CandidateRecord> {
        let record = view.get(row.checked_sub(1)?)?;
        let flags = record.flags.toggled(flag);
        self.edits.insert(record.key(), flags);
        Some(record.clone().with_flags(flags))
    }

    /// Forgets edits the authoritative table already agrees with.
    pub fn prune(&mut self, authoritative: &CandidateTable) {
        self.edits.retain(|key, flags| match authoritative.find(key) {
            Some(row) => row.flags != *flags,
            None => false,
        });
    }

    pub fn render(&self, view: &CandidateTable, theme: &Theme) -> String {
        let mut out = String::new();
        if view.is_empty() {
            let _ = writeln!(out, "{}", theme.paint("(no matching candidates)", theme::MUTED));
            return out;
        }

        let first_w = width(view, |r| &r.first_name, "first_name");
        let last_w = width(view, |r| &r.last_name, "last_name");
        let mut header = format!("{:>3}  {:first_w$}  {:last_w$}", "#", "first_name", "last_name");
        for flag in Flag::ALL {
            let _ = write!(header, "  {:^w$}", flag.column(), w = flag_width(flag));
        }
        header.push_str("  file_name");
        let _ = writeln!(out, "{}", theme.paint(header, theme::HEADER));

        for (i, row) in view.iter().enumerate() {
            let pending = self.is_edited(&row.key());
            let _ = write!(out, "{:>3}  {:first_w$}  {:last_w$}", i + 1, row.first_name, row.last_name);
            for flag in Flag::ALL {
                let cell = theme.checkbox(row.flags.get(flag), pending);
                // Pad by the visible width; escape codes do not take columns.
                let pad = flag_width(flag).saturating_sub(4);
                let _ = write!(out, "  {}{}{}", " ".repeat(pad / 2), cell, " ".repeat(pad - pad / 2));
            }
            let _ = writeln!(out, "  {}", theme.paint(&row.file_url, theme::MUTED));
        }
        out
    }
}

fn width(view: &CandidateTable, field: impl Fn(&CandidateRecord) -> &String, header: &str) -> usize {
    view.iter().map(|r| field(r).chars().count()).max().unwrap_or(0).max(header.len())
}

fn flag_width(flag: Flag) -> usize {
    flag.column().len().max(4)
}
