//! Error taxonomy shared by the session store, provider adapters and flows.
//! Provider failures are opaque messages meant for the user; cache corruption
//! is absorbed by the session store and never escapes `is_logged_in`.

use thiserror::Error;

/// Failures reported by the identity provider or on the way to it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider refused the request (bad credential, existing account,
    /// weak password, disabled user, ...).
    #[error("{0}")]
    Rejected(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Config error: {0}")]
    Config(String),
    /// An operation that needs a signed-in user was called without one.
    #[error("No user is currently signed in.")]
    NoCurrentUser,
}

// Request URLs carry the API key, so they are stripped before display.
impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Failures writing the profile mirror into the document store.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("record must be a JSON object")]
    InvalidRecord,
    #[error("document store request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("not authorized to write the profile record")]
    Unauthenticated,
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.without_url().to_string())
    }
}

/// Failures of the local key-value cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache content is malformed: {0}")]
    Corrupt(String),
    #[error("cache lock poisoned")]
    Poisoned,
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Corrupt(err.to_string())
    }
}
