//! Terminal front end for the shared candidate roster.
//!
//! The grid keeps unsaved flag edits as an overlay keyed by row identity and
//! hands the edited view to [`roster_sync::SyncController`] after every
//! command.

pub mod ui;
