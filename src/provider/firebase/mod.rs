//! Firebase adapters over the public REST APIs: Identity Toolkit and Secure
//! Token for authentication, Firestore for the profile mirror. Base URLs are
//! configurable so the local emulators and test servers can stand in for the
//! hosted endpoints. The API key travels in query strings, so request URLs are
//! never logged.

pub mod auth;
pub mod firestore;

pub use auth::FirebaseAuth;
pub use firestore::Firestore;

use crate::errors::ProviderError;
use secrecy::SecretString;
use serde::{de::DeserializeOwned, Deserialize};

pub const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com";
pub const DEFAULT_TOKEN_URL: &str = "https://securetoken.googleapis.com";
pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com";

/// Maximum number of error body characters surfaced to the user.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Clone, Debug)]
pub struct FirebaseConfig {
    pub api_key: SecretString,
    pub project_id: String,
    pub auth_url: String,
    pub token_url: String,
    pub firestore_url: String,
    /// Token handed to `signInWithIdp` in place of a browser popup.
    pub idp_token: Option<SecretString>,
}

impl FirebaseConfig {
    #[must_use]
    pub fn new(api_key: SecretString, project_id: impl Into<String>) -> Self {
        Self {
            api_key,
            project_id: project_id.into(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            firestore_url: DEFAULT_FIRESTORE_URL.to_string(),
            idp_token: None,
        }
    }

    /// Points every endpoint at one host, e.g. a local proxy or a test server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim().trim_end_matches('/').to_string();
        self.auth_url.clone_from(&base);
        self.token_url.clone_from(&base);
        self.firestore_url = base;
        self
    }
}

/// Identity platform error envelope: `{"error": {"code": 400, "message": "EMAIL_EXISTS"}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Turns a provider error code into the message shown to the user.
/// Codes may carry a detail after ` : `, e.g. `WEAK_PASSWORD : Password should be ...`.
#[must_use]
pub fn describe_error_code(raw: &str) -> String {
    let (code, detail) = match raw.split_once(" : ") {
        Some((code, detail)) => (code.trim(), Some(detail.trim())),
        None => (raw.trim(), None),
    };

    let message = match code {
        "EMAIL_EXISTS" => "The email address is already in use by another account.",
        "EMAIL_NOT_FOUND" => "There is no user record corresponding to this email.",
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => "The email or password is incorrect.",
        "INVALID_EMAIL" => "The email address is badly formatted.",
        "MISSING_PASSWORD" => "A password is required.",
        "USER_DISABLED" => "The user account has been disabled by an administrator.",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => {
            "Access to this account has been temporarily disabled due to many failed attempts. Try again later."
        }
        "OPERATION_NOT_ALLOWED" => "This sign-in method is disabled for this project.",
        "TOKEN_EXPIRED" | "INVALID_ID_TOKEN" | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" => {
            "Your session has expired. Please sign in again."
        }
        "INVALID_IDP_RESPONSE" => "The identity provider credential is invalid or has expired.",
        "WEAK_PASSWORD" => {
            return detail.map_or_else(
                || "The password is too weak.".to_string(),
                ToString::to_string,
            );
        }
        _ => return raw.trim().to_string(),
    };

    message.to_string()
}

/// Parses a JSON response or maps the error envelope into a rejection.
async fn handle_json_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    if response.status().is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|err| {
                ProviderError::Parse(format!("Failed to decode response: {}", err.without_url()))
            });
    }

    Err(rejection_from(response).await)
}

/// Same as `handle_json_response` for endpoints whose success body is ignored.
async fn handle_empty_response(response: reqwest::Response) -> Result<(), ProviderError> {
    if response.status().is_success() {
        return Ok(());
    }

    Err(rejection_from(response).await)
}

async fn rejection_from(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    // Server-side failures say nothing about the credential.
    if status >= 500 {
        return ProviderError::Network(format!(
            "Service unavailable ({status}): {}",
            sanitize_body(&body)
        ));
    }

    // Only a provider error code is a verdict on the request; anything else
    // (a proxy page, a wrong endpoint) leaves the credential alone.
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) if !envelope.error.message.is_empty() => {
            ProviderError::Rejected(describe_error_code(&envelope.error.message))
        }
        _ => ProviderError::Parse(format!(
            "Unexpected response ({status}): {}",
            sanitize_body(&body)
        )),
    }
}

/// Trims and truncates error bodies for user-facing messages.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
