//! Seams to the hosted services the session manager delegates to: the identity
//! provider (credential checks, tokens, emails, popups) and the document store
//! that mirrors user profiles. Concrete Firebase adapters live in `firebase`.

pub mod firebase;

use crate::errors::{ProviderError, StoreError};
use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};
use tokio::sync::watch;

/// User as reported by the identity provider, before boundary validation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub email_verified: bool,
}

/// Receiving end of the provider's state-change notifications. `None` means
/// nobody is signed in.
pub type AuthStateReceiver = watch::Receiver<Option<AuthUser>>;

/// Federated identity providers available through popup sign-in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Google,
    GitHub,
    Facebook,
}

impl ProviderKind {
    /// Provider identifier understood by the identity platform.
    #[must_use]
    pub const fn provider_id(self) -> &'static str {
        match self {
            Self::Google => "google.com",
            Self::GitHub => "github.com",
            Self::Facebook => "facebook.com",
        }
    }

    /// Google issues OIDC id tokens; the others hand out OAuth access tokens.
    #[must_use]
    pub const fn token_param(self) -> &'static str {
        match self {
            Self::Google => "id_token",
            Self::GitHub | Self::Facebook => "access_token",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Google => "google",
            Self::GitHub => "github",
            Self::Facebook => "facebook",
        };
        f.write_str(name)
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "google" | "google.com" => Ok(Self::Google),
            "github" | "github.com" => Ok(Self::GitHub),
            "facebook" | "facebook.com" => Ok(Self::Facebook),
            other => Err(format!("unsupported identity provider: {other}")),
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthUser, ProviderError>;

    async fn create_account(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthUser, ProviderError>;

    async fn send_password_reset_email(&self, email: &str) -> Result<(), ProviderError>;

    /// Sends a verification email to the currently signed-in user.
    async fn send_email_verification(&self) -> Result<(), ProviderError>;

    async fn sign_in_with_popup(&self, kind: ProviderKind) -> Result<AuthUser, ProviderError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// Subscribes to state changes. The receiver starts at the current state.
    fn subscribe(&self) -> AuthStateReceiver;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Writes `record` into `collection/key`, keeping fields it does not mention.
    async fn upsert_merge(
        &self,
        collection: &str,
        key: &str,
        record: &Map<String, Value>,
    ) -> Result<(), StoreError>;
}
