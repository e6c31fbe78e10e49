//! Candidate roster synchronization against a shared CSV file.
//!
//! Reads go through a public share link ([`HttpSnapshotSource`]) with a short
//! cache; writes go through an authenticated blob store ([`DropboxStore`])
//! behind a refreshable credential. Between the two sits the
//! [`SyncController`], which turns grid edits into debounced optimistic
//! writes with rollback.

pub mod auth;
pub mod codec;
pub mod config;
pub mod controller;
mod error;
mod merge;
mod row;
mod schema;
mod session;
pub mod storage;
mod sync;
mod table;

pub use auth::{AccessToken, CredentialProvider, Credentials, OAuthTokenEndpoint, RefreshCredentials, TokenExchanger};
pub use config::{Diagnostics, SyncConfig};
pub use controller::{SyncController, SyncOutcome};
pub use error::{AuthError, AuthResult, Error, Result, StoreError, StoreResult, WriteError};
pub use merge::{merge_flags, MergeReport};
pub use row::{compute_key, CandidateRecord, Flag, Flags, RowKey, COLUMNS};
pub use schema::{normalize, normalize_with_report, parse_flag, NormalizeReport, RawTable};
pub use session::{Notice, NoticeLevel, Session, Status};
pub use storage::{
    BlobStore, DropboxStore, HttpSnapshotSource, MemoryStore, SnapshotReader, SnapshotSource, SnapshotWriter,
    TableWriter,
};
pub use sync::{diff, ChangedRows, Snapshot};
pub use table::CandidateTable;
