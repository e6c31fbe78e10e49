//! Remote table store: a cached public read path and an authenticated write
//! path. The two share nothing but the CSV format.

mod dropbox;
mod memory;
mod shared_link;

pub use dropbox::{DropboxStore, DEFAULT_API_BASE, DEFAULT_CONTENT_BASE};
pub use memory::MemoryStore;
pub use shared_link::{force_download_link, HttpSnapshotSource};

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::auth::{AccessToken, CredentialProvider, TokenExchanger};
use crate::codec;
use crate::error::{Result, StoreError, StoreResult, WriteError};
use crate::schema::normalize_with_report;
use crate::table::CandidateTable;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10);

/// Source of the raw CSV document.
pub trait SnapshotSource {
    fn fetch_csv(&self) -> Result<String>;
}

/// Authenticated blob storage addressed by absolute path.
pub trait BlobStore {
    fn create_folder(&mut self, token: &AccessToken, path: &str) -> StoreResult<()>;
    fn upload(&mut self, token: &AccessToken, path: &str, contents: &[u8]) -> StoreResult<()>;
}

/// Persists a whole table. Implementations report failures as values.
pub trait TableWriter {
    fn write_snapshot(&mut self, table: &CandidateTable) -> std::result::Result<(), WriteError>;
}

struct CachedTable {
    fetched_at: Instant,
    table: CandidateTable,
}

/// Read path with a short time-to-live cache in front of the source.
pub struct SnapshotReader<S: SnapshotSource> {
    source: S,
    ttl: Duration,
    cached: Option<CachedTable>,
}

impl<S: SnapshotSource> SnapshotReader<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self { source, ttl, cached: None }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn fetch_snapshot(&mut self) -> Result<CandidateTable> {
        self.fetch_snapshot_at(Instant::now())
    }

    pub fn fetch_snapshot_at(&mut self, now: Instant) -> Result<CandidateTable> {
        if let Some(cached) = &self.cached {
            if now.saturating_duration_since(cached.fetched_at) < self.ttl {
                debug!(rows = cached.table.len(), "serving roster from cache");
                return Ok(cached.table.clone());
            }
        }

        let text = self.source.fetch_csv()?;
        let (table, report) = normalize_with_report(&codec::decode(&text)?);
        info!(rows = table.len(), duplicates = report.duplicates_dropped, "fetched roster");
        self.cached = Some(CachedTable { fetched_at: now, table: table.clone() });
        Ok(table)
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

/// Write path: overwrites the CSV at a fixed path, refreshing credentials
/// once if the backend rejects the current token.
pub struct SnapshotWriter<B: BlobStore, X: TokenExchanger> {
    blobs: B,
    credentials: CredentialProvider<X>,
    path: Option<String>,
}

impl<B: BlobStore, X: TokenExchanger> SnapshotWriter<B, X> {
    pub fn new(blobs: B, credentials: CredentialProvider<X>, path: Option<String>) -> Self {
        let path = path.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
        Self { blobs, credentials, path }
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    pub fn credentials(&self) -> &CredentialProvider<X> {
        &self.credentials
    }

    fn attempt(&mut self, token: &AccessToken, path: &str, contents: &[u8]) -> StoreResult<()> {
        if let Some(parent) = parent_folder(path) {
            match self.blobs.create_folder(token, parent) {
                Ok(()) | Err(StoreError::Conflict(_)) => {}
                Err(e) => return Err(e),
            }
        }
        self.blobs.upload(token, path, contents)
    }
}

impl<B: BlobStore, X: TokenExchanger> TableWriter for SnapshotWriter<B, X> {
    fn write_snapshot(&mut self, table: &CandidateTable) -> std::result::Result<(), WriteError> {
        let path = self.path.clone().ok_or(WriteError::MissingWritePath)?;
        let contents = codec::encode(table).map_err(|e| WriteError::Encode(e.to_string()))?;
        let token = self.credentials.get()?;

        match self.attempt(&token, &path, &contents) {
            Ok(()) => {
                info!(path = %path, rows = table.len(), bytes = contents.len(), "roster written");
                Ok(())
            }
            Err(StoreError::Auth(reason)) => {
                warn!(reason = %reason, "token rejected, refreshing and retrying once");
                let token = self
                    .credentials
                    .force_refresh()
                    .map_err(|e| WriteError::AuthAfterRefresh(e.to_string()))?;
                self.attempt(&token, &path, &contents)
                    .map_err(|e| WriteError::AuthAfterRefresh(e.to_string()))?;
                info!(path = %path, rows = table.len(), "roster written after token refresh");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "roster write failed");
                Err(WriteError::Store(e))
            }
        }
    }
}

/// Parent folder of an absolute path, or `None` at the root.
pub fn parent_folder(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    let (parent, _) = trimmed.rsplit_once('/')?;
    if parent.is_empty() {
        None
    } else {
        Some(parent)
    }
}
