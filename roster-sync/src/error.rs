use thiserror::Error;

/// Failures on the read path and in configuration handling.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("csv error: {0}")]
    Csv(String),
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Csv(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the credential provider.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error(
        "credentials missing: provide DROPBOX_ACCESS_TOKEN or \
         DROPBOX_APP_KEY, DROPBOX_APP_SECRET and DROPBOX_REFRESH_TOKEN"
    )]
    CredentialsMissing,
    #[error("token refresh failed: {0}")]
    TokenRefresh(String),
    #[error("network error: {0}")]
    Network(String),
}

pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Failure of a single call against the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Expired, revoked or otherwise rejected bearer token.
    #[error("authentication rejected: {0}")]
    Auth(String),
    /// The target already exists.
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Outcome of a failed `write_snapshot`, ready to be shown to the user.
#[derive(Debug, Clone, Error)]
pub enum WriteError {
    #[error("write path not configured")]
    MissingWritePath,
    #[error("{0}")]
    Credentials(#[from] AuthError),
    #[error("could not encode table: {0}")]
    Encode(String),
    #[error("authentication failed after refresh: {0}")]
    AuthAfterRefresh(String),
    #[error("{0}")]
    Store(StoreError),
}

impl WriteError {
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            WriteError::MissingWritePath | WriteError::Credentials(AuthError::CredentialsMissing)
        )
    }
}
