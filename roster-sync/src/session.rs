use std::time::Instant;

use crate::error::Result;
use crate::storage::{SnapshotReader, SnapshotSource};
use crate::sync::Snapshot;
use crate::table::CandidateTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Transient notices plus one persistent error that stays until a later
/// success clears it.
#[derive(Debug, Clone, Default)]
pub struct Status {
    notices: Vec<Notice>,
    error: Option<String>,
}

impl Status {
    pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice { level, message: message.into() });
    }

    /// Notices not yet shown; each is returned once.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

/// Per-user state for one grid session.
///
/// The authoritative table is only replaced by the sync controller (or an
/// explicit reload); searching narrows what is shown without touching it.
#[derive(Debug, Clone)]
pub struct Session {
    table: CandidateTable,
    snapshot: Option<Snapshot>,
    last_write: Option<Instant>,
    query: String,
    autosave: bool,
    status: Status,
}

impl Session {
    pub fn new(table: CandidateTable, autosave: bool) -> Self {
        Self {
            table,
            snapshot: None,
            last_write: None,
            query: String::new(),
            autosave,
            status: Status::default(),
        }
    }

    /// Initial load from the read path. A failed fetch leaves no session at all.
    pub fn load<S: SnapshotSource>(reader: &mut SnapshotReader<S>, autosave: bool) -> Result<Self> {
        Ok(Self::new(reader.fetch_snapshot()?, autosave))
    }

    /// Swaps in a freshly fetched table and forgets the diff baseline.
    pub fn reload(&mut self, table: CandidateTable) {
        self.table = table;
        self.snapshot = None;
    }

    pub fn table(&self) -> &CandidateTable {
        &self.table
    }

    pub fn visible(&self) -> CandidateTable {
        self.table.search(&self.query)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn clear_query(&mut self) {
        self.query.clear();
    }

    pub fn autosave(&self) -> bool {
        self.autosave
    }

    pub fn set_autosave(&mut self, on: bool) {
        self.autosave = on;
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn last_write(&self) -> Option<Instant> {
        self.last_write
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut Status {
        &mut self.status
    }

    pub(crate) fn set_baseline(&mut self, snapshot: Snapshot) {
        self.snapshot = Some(snapshot);
    }

    /// Installs `table` and returns the one it replaced.
    pub(crate) fn swap_table(&mut self, table: CandidateTable) -> CandidateTable {
        std::mem::replace(&mut self.table, table)
    }

    pub(crate) fn record_write(&mut self, at: Instant) {
        self.last_write = Some(at);
    }
}
