//! Bearer credentials for the storage backend.
//!
//! Two strategies hide behind [`CredentialProvider`]: a long-lived static
//! access token, or an app key/secret plus refresh token exchanged for a
//! short-lived (about four hours) access token. The provider caches whatever
//! it obtained; [`CredentialProvider::force_refresh`] is the only way to
//! replace it.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{AuthError, AuthResult};

pub const DEFAULT_TOKEN_URL: &str = "https://api.dropbox.com/oauth2/token";

const TOKEN_TIMEOUT: Duration = Duration::from_secs(15);

pub const ENV_ACCESS_TOKEN: &str = "DROPBOX_ACCESS_TOKEN";
pub const ENV_APP_KEY: &str = "DROPBOX_APP_KEY";
pub const ENV_APP_SECRET: &str = "DROPBOX_APP_SECRET";
pub const ENV_REFRESH_TOKEN: &str = "DROPBOX_REFRESH_TOKEN";

/// Bearer token. The value is redacted from `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct RefreshCredentials {
    pub app_key: String,
    pub app_secret: String,
    pub refresh_token: String,
}

impl fmt::Debug for RefreshCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshCredentials")
            .field("app_key", &self.app_key)
            .field("app_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Secrets available to the provider. Either strategy may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: Option<AccessToken>,
    pub refresh: Option<RefreshCredentials>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the four secret names through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let refresh = match (get(ENV_APP_KEY), get(ENV_APP_SECRET), get(ENV_REFRESH_TOKEN)) {
            (Some(app_key), Some(app_secret), Some(refresh_token)) => Some(RefreshCredentials {
                app_key,
                app_secret,
                refresh_token,
            }),
            _ => None,
        };
        Self { access_token: get(ENV_ACCESS_TOKEN).map(AccessToken), refresh }
    }

    pub fn is_configured(&self) -> bool {
        self.access_token.is_some() || self.refresh.is_some()
    }
}

/// Swaps refresh credentials for a fresh access token.
pub trait TokenExchanger {
    fn exchange(&self, credentials: &RefreshCredentials) -> AuthResult<AccessToken>;
}

/// OAuth2 token endpoint speaking the `refresh_token` grant.
pub struct OAuthTokenEndpoint {
    http: Client,
    url: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

impl OAuthTokenEndpoint {
    pub fn new(url: impl Into<String>) -> AuthResult<Self> {
        let http = Client::builder()
            .timeout(TOKEN_TIMEOUT)
            .build()
            .map_err(|e| AuthError::Network(e.to_string()))?;
        Ok(Self { http, url: url.into() })
    }
}

impl TokenExchanger for OAuthTokenEndpoint {
    fn exchange(&self, credentials: &RefreshCredentials) -> AuthResult<AccessToken> {
        let response = self
            .http
            .post(&self.url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", credentials.refresh_token.as_str()),
                ("client_id", credentials.app_key.as_str()),
                ("client_secret", credentials.app_secret.as_str()),
            ])
            .send()
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(AuthError::TokenRefresh(format!("status {status}: {text}")));
        }

        let body: TokenResponse = response
            .json()
            .map_err(|e| AuthError::TokenRefresh(format!("invalid response: {e}")))?;
        body.access_token
            .filter(|t| !t.is_empty())
            .map(AccessToken)
            .ok_or_else(|| AuthError::TokenRefresh("missing access_token".into()))
    }
}

pub struct CredentialProvider<X: TokenExchanger = OAuthTokenEndpoint> {
    credentials: Credentials,
    exchanger: X,
    cached: Option<AccessToken>,
}

impl<X: TokenExchanger> CredentialProvider<X> {
    pub fn new(credentials: Credentials, exchanger: X) -> Self {
        Self { credentials, exchanger, cached: None }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn exchanger(&self) -> &X {
        &self.exchanger
    }

    /// Cached token, building it on first use: the static token when one is
    /// configured, otherwise a refresh exchange.
    pub fn get(&mut self) -> AuthResult<AccessToken> {
        if let Some(token) = &self.cached {
            return Ok(token.clone());
        }
        let token = match (&self.credentials.access_token, &self.credentials.refresh) {
            (Some(token), _) => {
                debug!("using static access token");
                token.clone()
            }
            (None, Some(refresh)) => self.exchange(refresh)?,
            (None, None) => return Err(AuthError::CredentialsMissing),
        };
        self.cached = Some(token.clone());
        Ok(token)
    }

    /// Re-runs the refresh exchange regardless of the cache. Without refresh
    /// credentials this hands back the current token unchanged, which may
    /// still be expired; the caller finds out on its next request.
    pub fn force_refresh(&mut self) -> AuthResult<AccessToken> {
        let Some(refresh) = self.credentials.refresh.clone() else {
            debug!("no refresh credentials, keeping current token");
            return self.get();
        };
        let token = self.exchange(&refresh)?;
        self.cached = Some(token.clone());
        Ok(token)
    }

    fn exchange(&self, refresh: &RefreshCredentials) -> AuthResult<AccessToken> {
        let token = self.exchanger.exchange(refresh)?;
        info!("obtained access token from refresh token");
        Ok(token)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::{Cell, RefCell};

    use super::*;

    /// Hands out `token-1`, `token-2`, ... or replays queued failures.
    #[derive(Default)]
    pub struct CountingExchanger {
        pub calls: Cell<usize>,
        pub failures: RefCell<Vec<AuthError>>,
    }

    impl TokenExchanger for CountingExchanger {
        fn exchange(&self, _credentials: &RefreshCredentials) -> AuthResult<AccessToken> {
            self.calls.set(self.calls.get() + 1);
            if let Some(err) = self.failures.borrow_mut().pop() {
                return Err(err);
            }
            Ok(AccessToken::new(format!("token-{}", self.calls.get())))
        }
    }

    pub fn refresh_credentials() -> RefreshCredentials {
        RefreshCredentials {
            app_key: "key".into(),
            app_secret: "secret".into(),
            refresh_token: "refresh".into(),
        }
    }
}
