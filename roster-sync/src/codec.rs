//! CSV wire format for the roster: comma-separated, UTF-8, header required.

use crate::error::{Error, Result};
use crate::row::COLUMNS;
use crate::schema::RawTable;
use crate::table::{flag_cell, CandidateTable};

pub fn decode(text: &str) -> Result<RawTable> {
    let text = text.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(Error::Csv("missing header row".into()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(RawTable { headers, rows })
}

/// Serializes in canonical column order with flags written as `0`/`1`.
pub fn encode(table: &CandidateTable) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(COLUMNS)?;
    for r in table {
        let mut record = vec![r.first_name.as_str(), r.last_name.as_str(), r.file_url.as_str()];
        record.extend(r.flags.iter().map(|(_, on)| flag_cell(on)));
        writer.write_record(&record)?;
    }
    writer.into_inner().map_err(|e| Error::Csv(e.to_string()))
}
