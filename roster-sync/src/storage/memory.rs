use std::collections::{HashMap, HashSet, VecDeque};

use super::{BlobStore, SnapshotSource};
use crate::auth::AccessToken;
use crate::error::{Error, Result, StoreError, StoreResult};

/// In-process blob store and CSV source. Failures can be queued to exercise
/// the retry and rollback paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: HashMap<String, Vec<u8>>,
    folders: HashSet<String>,
    source_path: Option<String>,
    upload_failures: VecDeque<StoreError>,
    folder_failures: VecDeque<StoreError>,
    upload_attempts: usize,
    last_token: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding one CSV document that is also served as the snapshot source.
    pub fn with_csv(path: &str, csv: &str) -> Self {
        let mut store = Self::new();
        store.files.insert(path.to_string(), csv.as_bytes().to_vec());
        store.source_path = Some(path.to_string());
        store
    }

    pub fn fail_next_upload(&mut self, error: StoreError) {
        self.upload_failures.push_back(error);
    }

    pub fn fail_next_folder(&mut self, error: StoreError) {
        self.folder_failures.push_back(error);
    }

    pub fn upload_attempts(&self) -> usize {
        self.upload_attempts
    }

    pub fn last_token(&self) -> Option<String> {
        self.last_token.clone()
    }

    pub fn has_folder(&self, path: &str) -> bool {
        self.folders.contains(path)
    }

    pub fn file_text(&self, path: &str) -> Option<String> {
        self.files
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

impl BlobStore for MemoryStore {
    fn create_folder(&mut self, _token: &AccessToken, path: &str) -> StoreResult<()> {
        if let Some(err) = self.folder_failures.pop_front() {
            return Err(err);
        }
        if !self.folders.insert(path.to_string()) {
            return Err(StoreError::Conflict(format!("path/conflict/folder: {path}")));
        }
        Ok(())
    }

    fn upload(&mut self, token: &AccessToken, path: &str, contents: &[u8]) -> StoreResult<()> {
        self.upload_attempts += 1;
        self.last_token = Some(token.secret().to_string());
        if let Some(err) = self.upload_failures.pop_front() {
            return Err(err);
        }
        self.files.insert(path.to_string(), contents.to_vec());
        Ok(())
    }
}

impl SnapshotSource for MemoryStore {
    fn fetch_csv(&self) -> Result<String> {
        self.source_path
            .as_deref()
            .and_then(|path| self.file_text(path))
            .ok_or_else(|| Error::Fetch("no document at source path".into()))
    }
}
