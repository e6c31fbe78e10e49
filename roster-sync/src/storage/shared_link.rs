use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;
use url::Url;

use super::SnapshotSource;
use crate::error::{Error, Result};

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Rewrites a shared-file link so the server returns the raw bytes instead of
/// a preview page: every `dl` parameter becomes `dl=1`, and one is appended
/// when none is present. Other parameters are kept as written, escapes included.
pub fn force_download_link(link: &str) -> Result<Url> {
    let mut url = Url::parse(link.trim()).map_err(|e| Error::Config(format!("invalid shared link: {e}")))?;

    let mut found = false;
    let mut pairs: Vec<&str> = url
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            if pair.split('=').next() == Some("dl") {
                found = true;
                "dl=1"
            } else {
                pair
            }
        })
        .collect();
    if !found {
        pairs.push("dl=1");
    }

    let query = pairs.join("&");
    url.set_query(Some(&query));
    Ok(url)
}

/// Unauthenticated GET of a public CSV export.
pub struct HttpSnapshotSource {
    http: Client,
    url: Url,
}

impl HttpSnapshotSource {
    pub fn new(shared_link: &str) -> Result<Self> {
        let url = force_download_link(shared_link)?;
        let http = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| Error::Fetch(e.to_string()))?;
        Ok(Self { http, url })
    }
}

impl SnapshotSource for HttpSnapshotSource {
    fn fetch_csv(&self) -> Result<String> {
        debug!(url = %self.url, "fetching shared roster");
        let response = self
            .http
            .get(self.url.clone())
            .send()
            .map_err(|e| Error::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("status {status} from shared link")));
        }
        response.text().map_err(|e| Error::Fetch(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dl_zero_becomes_one() {
        let url = force_download_link("https://www.dropbox.com/scl/fi/abc/state.csv?rlkey=xyz&dl=0").unwrap();
        assert_eq!(url.as_str(), "https://www.dropbox.com/scl/fi/abc/state.csv?rlkey=xyz&dl=1");
    }

    #[test]
    fn test_dl_keeps_position() {
        let url = force_download_link("https://host/f.csv?dl=0&rlkey=xyz").unwrap();
        assert_eq!(url.query(), Some("dl=1&rlkey=xyz"));
    }

    #[test]
    fn test_missing_dl_is_appended() {
        assert_eq!(force_download_link("https://host/f.csv").unwrap().query(), Some("dl=1"));
        assert_eq!(
            force_download_link("https://host/f.csv?rlkey=a").unwrap().query(),
            Some("rlkey=a&dl=1")
        );
    }

    #[test]
    fn test_other_parameters_keep_their_escapes() {
        let url = force_download_link("https://host/f.csv?q=a%20b&x=~y&dl=0").unwrap();
        assert_eq!(url.query(), Some("q=a%20b&x=~y&dl=1"));
        let url = force_download_link("https://host/f.csv?name=J%C3%A9r%C3%B4me+R").unwrap();
        assert_eq!(url.query(), Some("name=J%C3%A9r%C3%B4me+R&dl=1"));
    }

    #[test]
    fn test_already_normalized_is_unchanged() {
        let link = "https://host/f.csv?rlkey=a&dl=1";
        assert_eq!(force_download_link(link).unwrap().as_str(), link);
    }

    #[test]
    fn test_invalid_link_is_a_config_error() {
        assert!(matches!(force_download_link("not a url"), Err(Error::Config(_))));
    }
}
