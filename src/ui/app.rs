//! One roster session driven by typed commands. Every command is one
//! interaction: it may edit the grid, then runs a sync pass and redraws.

use std::io::{self, Write};
use std::time::Instant;

use roster_sync::{
    CandidateTable, Diagnostics, NoticeLevel, Session, SnapshotReader, SnapshotSource, SyncController,
    SyncOutcome, TableWriter,
};
use tracing::{debug, warn};

use super::commands::{Command, HELP};
use super::grid::Grid;
use super::theme::{self, Theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App<S: SnapshotSource, W: TableWriter> {
    session: Session,
    reader: SnapshotReader<S>,
    writer: W,
    controller: SyncController,
    grid: Grid,
    diagnostics: Diagnostics,
    theme: Theme,
}

impl<S: SnapshotSource, W: TableWriter> App<S, W> {
    pub fn new(
        session: Session,
        reader: SnapshotReader<S>,
        writer: W,
        controller: SyncController,
        diagnostics: Diagnostics,
        theme: Theme,
    ) -> Self {
        Self { session, reader, writer, controller, grid: Grid::new(), diagnostics, theme }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// First draw; takes the diff baseline.
    pub fn start(&mut self, now: Instant, out: &mut impl Write) -> io::Result<()> {
        self.render_pass(now, out)
    }

    pub fn handle(&mut self, command: Command, out: &mut impl Write) -> io::Result<Flow> {
        self.handle_at(command, Instant::now(), out)
    }

    pub fn handle_at(&mut self, command: Command, now: Instant, out: &mut impl Write) -> io::Result<Flow> {
        debug!(?command, "command");
        match command {
            Command::Show => self.render_pass(now, out)?,
            Command::Search(query) => {
                self.session.set_query(query);
                self.render_pass(now, out)?;
            }
            Command::Clear => {
                self.session.clear_query();
                self.render_pass(now, out)?;
            }
            Command::Toggle { row, flag } => {
                let view = self.current_view();
                match self.grid.toggle(&view, row, flag) {
                    Some(record) => {
                        let state = if record.flags.get(flag) { "on" } else { "off" };
                        writeln!(out, "{} {}: {flag} {state}", record.first_name, record.last_name)?;
                        self.render_pass(now, out)?;
                    }
                    None => {
                        let message = format!("no row {row}; {} row(s) shown", view.len());
                        writeln!(out, "{}", self.theme.paint(message, theme::WARNING))?;
                    }
                }
            }
            Command::Autosave(on) => {
                self.session.set_autosave(on);
                writeln!(out, "autosave {}", if on { "on" } else { "off" })?;
                let outcome = self.pass(now, false);
                self.report(&outcome, out)?;
            }
            Command::Save => {
                let outcome = self.pass(now, true);
                if matches!(outcome, SyncOutcome::Clean) {
                    writeln!(out, "{}", self.theme.paint("nothing to save", theme::MUTED))?;
                }
                self.report(&outcome, out)?;
            }
            Command::Refresh => self.refresh(now, out)?,
            Command::Status => self.print_status(now, out)?,
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => {
                self.shutdown(now, out)?;
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    /// Called on quit and end of input. Deferred edits are written only while
    /// autosave is on; with autosave paused they are dropped.
    pub fn shutdown(&mut self, now: Instant, out: &mut impl Write) -> io::Result<()> {
        if self.grid.pending() == 0 {
            return Ok(());
        }
        if self.session.autosave() {
            let outcome = self.pass(now, true);
            self.report(&outcome, out)?;
        }
        let dropped = self.grid.pending();
        if dropped > 0 {
            warn!(pending = dropped, autosave = self.session.autosave(), "exiting with unsaved edits");
            let message = format!("{dropped} unsaved change(s) discarded");
            writeln!(out, "{}", self.theme.paint(message, theme::WARNING))?;
        }
        Ok(())
    }

    fn current_view(&self) -> CandidateTable {
        self.grid.edited_view(&self.session.visible())
    }

    /// Runs the controller on the edited view. A pass that only took the
    /// baseline is repeated so edits made before it are not missed.
    fn pass(&mut self, now: Instant, flush: bool) -> SyncOutcome {
        let mut outcome = SyncOutcome::Baseline;
        for _ in 0..2 {
            let view = self.current_view();
            outcome = if flush {
                self.controller.flush_at(&mut self.session, &mut self.writer, &view, now)
            } else {
                self.controller.sync_at(&mut self.session, &mut self.writer, &view, now)
            };
            if !matches!(outcome, SyncOutcome::Baseline) {
                break;
            }
        }
        self.grid.prune(self.session.table());
        outcome
    }

    fn render_pass(&mut self, now: Instant, out: &mut impl Write) -> io::Result<()> {
        let outcome = self.pass(now, false);
        let view = self.current_view();
        write!(out, "{}", self.grid.render(&view, &self.theme))?;
        if !self.session.query().is_empty() {
            let filter = format!("{} of {} shown, filter: {:?}", view.len(), self.session.table().len(), self.session.query());
            writeln!(out, "{}", self.theme.paint(filter, theme::MUTED))?;
        }
        self.report(&outcome, out)
    }

    fn report(&mut self, outcome: &SyncOutcome, out: &mut impl Write) -> io::Result<()> {
        for notice in self.session.status_mut().drain_notices() {
            let color = match notice.level {
                NoticeLevel::Success => theme::SUCCESS,
                NoticeLevel::Info => theme::INFO,
            };
            writeln!(out, "{}", self.theme.paint(notice.message, color))?;
        }
        match outcome {
            SyncOutcome::Deferred { pending, retry_in } => {
                let message = format!("{pending} change(s) pending, saved by the next action after {} ms", retry_in.as_millis());
                writeln!(out, "{}", self.theme.paint(message, theme::INFO))?;
            }
            SyncOutcome::Held { pending } => {
                let message = format!("{pending} unsaved change(s), autosave is off (use 'save')");
                writeln!(out, "{}", self.theme.paint(message, theme::WARNING))?;
            }
            _ => {}
        }
        if let Some(error) = self.session.status().error() {
            writeln!(out, "{}", self.theme.paint(error, theme::ERROR))?;
        }
        Ok(())
    }

    /// Reloads the roster. Grid edits are keyed by identity, so they are
    /// reapplied to the fresh table and count as changes against its baseline.
    fn refresh(&mut self, now: Instant, out: &mut impl Write) -> io::Result<()> {
        self.reader.invalidate();
        match self.reader.fetch_snapshot_at(now) {
            Ok(table) => {
                let rows = table.len();
                self.session.reload(table);
                self.session.status_mut().notify(NoticeLevel::Info, format!("Reloaded {rows} candidate(s)"));
                self.render_pass(now, out)
            }
            Err(e) => {
                warn!(error = %e, "refresh failed");
                writeln!(out, "{}", self.theme.paint(format!("Refresh failed: {e}"), theme::ERROR))
            }
        }
    }

    fn print_status(&self, now: Instant, out: &mut impl Write) -> io::Result<()> {
        let d = &self.diagnostics;
        let token = match &d.token {
            Ok(()) => self.theme.paint("configured", theme::SUCCESS),
            Err(e) => self.theme.paint(e, theme::ERROR),
        };
        writeln!(out, "token        {token}")?;
        writeln!(out, "csv link     {}", if d.csv_link_configured { "configured" } else { "missing" })?;
        writeln!(out, "write path   {}", d.write_path.as_deref().unwrap_or("(not set)"))?;
        writeln!(out, "autosave     {}", if self.session.autosave() { "on" } else { "off" })?;
        writeln!(out, "debounce     {} ms", self.controller.debounce().as_millis())?;
        writeln!(out, "rows         {} ({} shown)", self.session.table().len(), self.session.visible().len())?;
        writeln!(out, "unsaved      {}", self.grid.pending())?;
        let last = match self.session.last_write() {
            Some(at) => format!("{:.1}s ago", now.saturating_duration_since(at).as_secs_f64()),
            None => "never".to_string(),
        };
        writeln!(out, "last write   {last}")?;
        if let Some(error) = self.session.status().error() {
            writeln!(out, "error        {}", self.theme.paint(error, theme::ERROR))?;
        }
        Ok(())
    }
}
