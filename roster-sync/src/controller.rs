//! Debounced optimistic write-back of grid edits.
//!
//! Each interaction runs one pass: diff the edited view against the session
//! baseline, and if anything changed, autosave is on and the debounce window
//! has passed, merge the changes into the authoritative table, publish that
//! immediately, and write it out. A failed write restores the previous table.
//!
//! There is no timer. Edits that land inside the window stay in the grid and
//! are picked up by the next pass that finds the window open, or by
//! [`SyncController::flush`].

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::WriteError;
use crate::merge::{merge_flags, MergeReport};
use crate::session::{NoticeLevel, Session};
use crate::storage::TableWriter;
use crate::sync::{diff, ChangedRows, Snapshot};
use crate::table::CandidateTable;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(350);

/// What a pass did. `Committed` and `RolledBack` are the two ends of a
/// write; every other variant means no write was issued.
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    /// No baseline existed; one was taken from the authoritative table.
    Baseline,
    /// The view matches the baseline.
    Clean,
    /// Changes exist but autosave is off.
    Held { pending: usize },
    /// Changes exist but the last write was too recent.
    Deferred { pending: usize, retry_in: Duration },
    Committed { changed: usize, merge: MergeReport },
    RolledBack { changed: usize, error: WriteError },
}

#[derive(Debug, Clone, Copy)]
pub struct SyncController {
    debounce: Duration,
}

impl Default for SyncController {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl SyncController {
    pub fn new(debounce: Duration) -> Self {
        Self { debounce }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn sync<W: TableWriter>(&self, session: &mut Session, writer: &mut W, view: &CandidateTable) -> SyncOutcome {
        self.sync_at(session, writer, view, Instant::now())
    }

    pub fn sync_at<W: TableWriter>(
        &self,
        session: &mut Session,
        writer: &mut W,
        view: &CandidateTable,
        now: Instant,
    ) -> SyncOutcome {
        let changed = match self.pending_changes(session, view) {
            Ok(changed) => changed,
            Err(outcome) => return outcome,
        };

        if !session.autosave() {
            debug!(pending = changed.len(), "autosave off, holding changes");
            return SyncOutcome::Held { pending: changed.len() };
        }

        if let Some(last) = session.last_write() {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.debounce {
                debug!(pending = changed.len(), ?elapsed, "inside debounce window, deferring");
                return SyncOutcome::Deferred { pending: changed.len(), retry_in: self.debounce - elapsed };
            }
        }

        self.commit(session, writer, view, changed, now)
    }

    /// Writes pending changes now, ignoring the debounce window and the
    /// autosave toggle.
    pub fn flush<W: TableWriter>(&self, session: &mut Session, writer: &mut W, view: &CandidateTable) -> SyncOutcome {
        self.flush_at(session, writer, view, Instant::now())
    }

    pub fn flush_at<W: TableWriter>(
        &self,
        session: &mut Session,
        writer: &mut W,
        view: &CandidateTable,
        now: Instant,
    ) -> SyncOutcome {
        match self.pending_changes(session, view) {
            Ok(changed) => self.commit(session, writer, view, changed, now),
            Err(outcome) => outcome,
        }
    }

    /// Non-empty diff of `view` against the baseline, or the outcome that
    /// ends the pass early.
    fn pending_changes(&self, session: &mut Session, view: &CandidateTable) -> Result<ChangedRows, SyncOutcome> {
        let Some(baseline) = session.snapshot() else {
            let baseline = Snapshot::capture(session.table());
            debug!(rows = baseline.len(), "baseline established");
            session.set_baseline(baseline);
            return Err(SyncOutcome::Baseline);
        };
        let changed = diff(baseline, view);
        if changed.is_empty() {
            return Err(SyncOutcome::Clean);
        }
        Ok(changed)
    }

    fn commit<W: TableWriter>(
        &self,
        session: &mut Session,
        writer: &mut W,
        view: &CandidateTable,
        changed: ChangedRows,
        now: Instant,
    ) -> SyncOutcome {
        let count = changed.len();
        let (candidate, merge) = merge_flags(session.table(), &changed);
        debug!(changed = count, updated = merge.updated, "pending write");

        let previous = session.swap_table(candidate);
        let result = writer.write_snapshot(session.table());
        session.record_write(now);

        match result {
            Ok(()) => {
                let baseline = session.snapshot().map_or_else(
                    || Snapshot::capture(session.table()),
                    |s| s.advanced(view),
                );
                session.set_baseline(baseline);
                let status = session.status_mut();
                status.clear_error();
                status.notify(NoticeLevel::Success, format!("Saved {count} change(s)"));
                info!(changed = count, "committed");
                SyncOutcome::Committed { changed: count, merge }
            }
            Err(error) => {
                session.swap_table(previous);
                session.status_mut().set_error(format!("Auto-save failed: {error}"));
                warn!(changed = count, %error, "rolled back");
                SyncOutcome::RolledBack { changed: count, error }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::row::{CandidateRecord, Flag};

    /// Records every table it is asked to write; fails while `failures` lasts.
    #[derive(Default)]
    struct RecordingWriter {
        writes: Vec<CandidateTable>,
        failures: Vec<WriteError>,
    }

    impl TableWriter for RecordingWriter {
        fn write_snapshot(&mut self, table: &CandidateTable) -> Result<(), WriteError> {
            self.writes.push(table.clone());
            match self.failures.pop() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    fn roster() -> CandidateTable {
        CandidateTable::from_records(vec![
            CandidateRecord::new("Jane", "Doe", "https://x/jane.pdf"),
            CandidateRecord::new("Amir", "Khan", "https://x/amir.pdf"),
            CandidateRecord::new("Lea", "Roux", "https://x/lea.pdf"),
        ])
    }

    fn edit(view: &CandidateTable, row: usize, flag: Flag) -> CandidateTable {
        let mut rows = view.rows().to_vec();
        rows[row].flags = rows[row].flags.toggled(flag);
        CandidateTable::from_records(rows)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Session with a baseline already taken at `t0`.
    fn primed(t0: Instant) -> (Session, RecordingWriter, SyncController) {
        let mut session = Session::new(roster(), true);
        let mut writer = RecordingWriter::default();
        let controller = SyncController::default();
        let view = session.visible();
        assert!(matches!(controller.sync_at(&mut session, &mut writer, &view, t0), SyncOutcome::Baseline));
        (session, writer, controller)
    }

    #[test]
    fn test_first_pass_only_takes_baseline() {
        let t0 = Instant::now();
        let (session, writer, _) = primed(t0);
        assert!(writer.writes.is_empty());
        assert_eq!(session.snapshot().map(Snapshot::len), Some(3));
    }

    #[test]
    fn test_clean_view_never_writes() {
        let t0 = Instant::now();
        let (mut session, mut writer, controller) = primed(t0);
        let view = session.visible();
        let outcome = controller.sync_at(&mut session, &mut writer, &view, t0 + ms(1000));
        assert!(matches!(outcome, SyncOutcome::Clean));
        assert!(writer.writes.is_empty());
    }

    #[test]
    fn test_commit_merges_and_advances_baseline() {
        let t0 = Instant::now();
        let (mut session, mut writer, controller) = primed(t0);
        let view = edit(&session.visible(), 0, Flag::Seen);

        let outcome = controller.sync_at(&mut session, &mut writer, &view, t0 + ms(10));
        assert!(matches!(outcome, SyncOutcome::Committed { changed: 1, .. }));
        assert_eq!(writer.writes.len(), 1);
        assert!(session.table().rows()[0].flags.seen);
        assert_eq!(writer.writes[0], *session.table());

        let baseline = session.snapshot().unwrap();
        for row in session.table() {
            assert_eq!(baseline.get(&row.key()), Some(row.flags));
        }
        assert_eq!(session.last_write(), Some(t0 + ms(10)));
        let notices = session.status_mut().drain_notices();
        assert_eq!(notices[0].message, "Saved 1 change(s)");
    }

    #[test]
    fn test_edits_inside_window_coalesce_into_one_write() {
        let t0 = Instant::now();
        let (mut session, mut writer, controller) = primed(t0);

        // A write at t0+1s opens the debounce window.
        let first = edit(&session.visible(), 2, Flag::Contacted);
        controller.sync_at(&mut session, &mut writer, &first, t0 + ms(1000));
        assert_eq!(writer.writes.len(), 1);

        let a = edit(&first, 0, Flag::Seen);
        let outcome = controller.sync_at(&mut session, &mut writer, &a, t0 + ms(1100));
        assert!(matches!(outcome, SyncOutcome::Deferred { pending: 1, .. }));

        let b = edit(&a, 1, Flag::CvSaved);
        let outcome = controller.sync_at(&mut session, &mut writer, &b, t0 + ms(1200));
        assert!(matches!(outcome, SyncOutcome::Deferred { pending: 2, .. }));
        assert_eq!(writer.writes.len(), 1, "nothing written inside the window");

        let outcome = controller.sync_at(&mut session, &mut writer, &b, t0 + ms(1400));
        assert!(matches!(outcome, SyncOutcome::Committed { changed: 2, .. }));
        assert_eq!(writer.writes.len(), 2, "exactly one write for both edits");
        let written = &writer.writes[1];
        assert!(written.rows()[0].flags.seen);
        assert!(written.rows()[1].flags.cv_saved);
        assert!(written.rows()[2].flags.contacted);
    }

    #[test]
    fn test_edits_outside_window_write_separately() {
        let t0 = Instant::now();
        let (mut session, mut writer, controller) = primed(t0);

        let a = edit(&session.visible(), 0, Flag::Seen);
        let first = controller.sync_at(&mut session, &mut writer, &a, t0 + ms(1000));
        let b = edit(&a, 1, Flag::IntendView);
        let second = controller.sync_at(&mut session, &mut writer, &b, t0 + ms(1400));

        assert!(matches!(first, SyncOutcome::Committed { changed: 1, .. }));
        assert!(matches!(second, SyncOutcome::Committed { changed: 1, .. }));
        assert_eq!(writer.writes.len(), 2);
    }

    #[test]
    fn test_failed_write_rolls_back_table_and_baseline() {
        let t0 = Instant::now();
        let (mut session, mut writer, controller) = primed(t0);
        let before_table = session.table().clone();
        let before_baseline = session.snapshot().cloned();
        writer.failures.push(WriteError::Store(StoreError::Api { status: 507, message: "insufficient_space".into() }));

        let view = edit(&session.visible(), 1, Flag::Contacted);
        let outcome = controller.sync_at(&mut session, &mut writer, &view, t0 + ms(1000));

        assert!(matches!(outcome, SyncOutcome::RolledBack { changed: 1, .. }));
        assert!(writer.writes[0].rows()[1].flags.contacted, "the optimistic table was the one written");
        assert_eq!(*session.table(), before_table);
        assert_eq!(session.snapshot().cloned(), before_baseline);
        assert_eq!(session.last_write(), Some(t0 + ms(1000)), "failures also open the window");
        assert!(session.status().error().unwrap().contains("insufficient_space"));

        // Same edit retried after the window succeeds and clears the error.
        let outcome = controller.sync_at(&mut session, &mut writer, &view, t0 + ms(1100));
        assert!(matches!(outcome, SyncOutcome::Deferred { .. }));
        let outcome = controller.sync_at(&mut session, &mut writer, &view, t0 + ms(1400));
        assert!(matches!(outcome, SyncOutcome::Committed { .. }));
        assert!(session.status().error().is_none());
    }

    #[test]
    fn test_autosave_off_holds_changes() {
        let t0 = Instant::now();
        let (mut session, mut writer, controller) = primed(t0);
        session.set_autosave(false);
        let before = session.snapshot().cloned();

        let view = edit(&session.visible(), 0, Flag::CvSaved);
        let outcome = controller.sync_at(&mut session, &mut writer, &view, t0 + ms(5000));
        assert!(matches!(outcome, SyncOutcome::Held { pending: 1 }));
        assert!(writer.writes.is_empty());
        assert_eq!(session.snapshot().cloned(), before);
        assert!(!session.table().rows()[0].flags.cv_saved);

        session.set_autosave(true);
        let outcome = controller.sync_at(&mut session, &mut writer, &view, t0 + ms(5001));
        assert!(matches!(outcome, SyncOutcome::Committed { changed: 1, .. }));
    }

    #[test]
    fn test_flush_ignores_window_and_toggle() {
        let t0 = Instant::now();
        let (mut session, mut writer, controller) = primed(t0);
        let a = edit(&session.visible(), 0, Flag::Seen);
        controller.sync_at(&mut session, &mut writer, &a, t0 + ms(1000));

        session.set_autosave(false);
        let b = edit(&a, 2, Flag::Seen);
        let outcome = controller.flush_at(&mut session, &mut writer, &b, t0 + ms(1001));
        assert!(matches!(outcome, SyncOutcome::Committed { changed: 1, .. }));
        assert_eq!(writer.writes.len(), 2);

        let outcome = controller.flush_at(&mut session, &mut writer, &b, t0 + ms(1002));
        assert!(matches!(outcome, SyncOutcome::Clean));
    }

    #[test]
    fn test_filtered_view_edits_merge_into_full_table() {
        let t0 = Instant::now();
        let (mut session, mut writer, controller) = primed(t0);
        session.set_query("khan");
        let view = edit(&session.visible(), 0, Flag::IntendView);

        controller.sync_at(&mut session, &mut writer, &view, t0 + ms(1000));
        assert_eq!(writer.writes[0].len(), 3, "the whole roster is written");
        assert!(session.table().rows()[1].flags.intend_view);

        session.clear_query();
        let full = session.visible();
        let outcome = controller.sync_at(&mut session, &mut writer, &full, t0 + ms(2000));
        assert!(matches!(outcome, SyncOutcome::Clean), "widening the filter is not a change");
    }
}
