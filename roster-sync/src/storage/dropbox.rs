use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::debug;

use super::BlobStore;
use crate::auth::AccessToken;
use crate::error::{StoreError, StoreResult};

pub const DEFAULT_API_BASE: &str = "https://api.dropboxapi.com";
pub const DEFAULT_CONTENT_BASE: &str = "https://content.dropboxapi.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct UploadArg<'a> {
    path: &'a str,
    mode: &'static str,
    mute: bool,
}

#[derive(Serialize)]
struct CreateFolderArg<'a> {
    path: &'a str,
    autorename: bool,
}

/// Blob store over the Dropbox HTTP API.
pub struct DropboxStore {
    http: Client,
    api_base: String,
    content_base: String,
}

impl DropboxStore {
    pub fn new(api_base: &str, content_base: &str) -> StoreResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            content_base: content_base.trim_end_matches('/').to_string(),
        })
    }
}

impl BlobStore for DropboxStore {
    fn create_folder(&mut self, token: &AccessToken, path: &str) -> StoreResult<()> {
        debug!(path, "ensuring folder");
        let response = self
            .http
            .post(format!("{}/2/files/create_folder_v2", self.api_base))
            .bearer_auth(token.secret())
            .json(&CreateFolderArg { path, autorename: false })
            .send()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        check(response)
    }

    fn upload(&mut self, token: &AccessToken, path: &str, contents: &[u8]) -> StoreResult<()> {
        let arg = serde_json::to_string(&UploadArg { path, mode: "overwrite", mute: true })
            .map_err(|e| StoreError::Api { status: 0, message: e.to_string() })?;
        debug!(path, bytes = contents.len(), "uploading");
        let response = self
            .http
            .post(format!("{}/2/files/upload", self.content_base))
            .bearer_auth(token.secret())
            .header("Dropbox-API-Arg", header_safe_json(&arg))
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(contents.to_vec())
            .send()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        check(response)
    }
}

fn check(response: Response) -> StoreResult<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let message = response.text().unwrap_or_default();
    Err(match status {
        StatusCode::UNAUTHORIZED => StoreError::Auth(message),
        StatusCode::CONFLICT => StoreError::Conflict(message),
        _ => StoreError::Api { status: status.as_u16(), message },
    })
}

/// HTTP header values must be ASCII; JSON allows escaping everything else.
pub(crate) fn header_safe_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}
