use crate::provider::AuthUser;
use serde::{Deserialize, Serialize};

/// Denormalized profile fields mirrored into the cache and the document store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub email: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(rename = "emailVerified")]
    pub email_verified: bool,
}

impl UserProfile {
    /// Validates a provider payload; a user without a `uid` is not an identity.
    #[must_use]
    pub fn from_user(user: &AuthUser) -> Option<Self> {
        let uid = user.uid.trim();
        if uid.is_empty() {
            return None;
        }

        Some(Self {
            uid: uid.to_string(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            photo_url: user.photo_url.clone(),
            email_verified: user.email_verified,
        })
    }
}

/// The client's current belief about whether a user is authenticated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    Authenticated(UserProfile),
    #[default]
    Anonymous,
}

impl SessionState {
    /// Maps a provider notification onto the tagged state.
    #[must_use]
    pub fn from_notification(user: Option<&AuthUser>) -> Self {
        user.and_then(UserProfile::from_user)
            .map_or(Self::Anonymous, Self::Authenticated)
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    #[must_use]
    pub fn profile(&self) -> Option<&UserProfile> {
        match self {
            Self::Authenticated(profile) => Some(profile),
            Self::Anonymous => None,
        }
    }
}
