#![allow(dead_code)]

use roster_sync::{CandidateRecord, CandidateTable, Flag, Flags};

pub fn generate_candidate(idx: usize) -> CandidateRecord {
    let first = ["Jane", "Amir", "Lea", "Kofi", "Mei", "Tomás"];
    let last = ["Doe", "Khan", "Roux", "Mensah", "Lin", "Álvarez"];

    let flags = Flags {
        seen: idx % 2 == 0,
        intend_view: idx % 3 == 0,
        cv_saved: idx % 5 == 0,
        contacted: idx % 7 == 0,
    };
    CandidateRecord::new(
        first[idx % first.len()],
        &format!("{}-{}", last[idx % last.len()], idx),
        &format!("https://files.example/cv/{idx}.pdf"),
    )
    .with_flags(flags)
}

pub fn create_roster(rows: usize) -> CandidateTable {
    (0..rows).map(generate_candidate).collect()
}

/// `roster` with `flag` flipped on the first `count` rows, as a grid would hand it over.
pub fn edited_view(roster: &CandidateTable, count: usize, flag: Flag) -> CandidateTable {
    roster
        .iter()
        .enumerate()
        .map(|(i, r)| if i < count { r.clone().with_flags(r.flags.toggled(flag)) } else { r.clone() })
        .collect()
}

pub fn roster_csv(rows: usize) -> String {
    let bytes = roster_sync::codec::encode(&create_roster(rows)).unwrap();
    String::from_utf8(bytes).unwrap()
}
