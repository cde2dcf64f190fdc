//! Identity provider backed by the Firebase Auth REST API. Like the hosted SDK,
//! it persists the signed-in user's refresh credential in the local cache and
//! re-validates it on `restore`, then publishes every state change on a watch
//! channel. Tokens are never logged.

use super::{handle_empty_response, handle_json_response, FirebaseConfig};
use crate::{
    errors::ProviderError,
    provider::{AuthStateReceiver, AuthUser, IdentityProvider, ProviderKind},
    session::LocalCache,
    APP_USER_AGENT,
};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use url::{form_urlencoded, Url};

/// Redirect URI reported to `signInWithIdp`; the token is supplied directly.
const IDP_REQUEST_URI: &str = "http://localhost";

/// Signed-in user plus the tokens needed to act on its behalf.
#[derive(Clone)]
struct Credential {
    user: AuthUser,
    id_token: SecretString,
    refresh_token: SecretString,
}

/// On-disk form of `Credential`, stored under `firebase:authUser:<project>`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedCredential {
    uid: String,
    email: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
    #[serde(default)]
    email_verified: bool,
    id_token: String,
    refresh_token: String,
}

impl From<&Credential> for PersistedCredential {
    fn from(credential: &Credential) -> Self {
        Self {
            uid: credential.user.uid.clone(),
            email: credential.user.email.clone(),
            display_name: credential.user.display_name.clone(),
            photo_url: credential.user.photo_url.clone(),
            email_verified: credential.user.email_verified,
            id_token: credential.id_token.expose_secret().to_string(),
            refresh_token: credential.refresh_token.expose_secret().to_string(),
        }
    }
}

impl From<PersistedCredential> for Credential {
    fn from(persisted: PersistedCredential) -> Self {
        Self {
            user: AuthUser {
                uid: persisted.uid,
                email: persisted.email,
                display_name: persisted.display_name,
                photo_url: persisted.photo_url,
                email_verified: persisted.email_verified,
            },
            id_token: SecretString::from(persisted.id_token),
            refresh_token: SecretString::from(persisted.refresh_token),
        }
    }
}

/// Response of `accounts:signInWithPassword`, `accounts:signUp` and `accounts:signInWithIdp`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
    email_verified: Option<bool>,
    id_token: String,
    refresh_token: String,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
    #[serde(default)]
    email_verified: bool,
}

impl From<LookupUser> for AuthUser {
    fn from(user: LookupUser) -> Self {
        Self {
            uid: user.local_id,
            email: user.email,
            display_name: user.display_name,
            photo_url: user.photo_url,
            email_verified: user.email_verified,
        }
    }
}

/// Secure token exchange response (snake case, unlike the identity toolkit).
#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    user_id: String,
}

pub struct FirebaseAuth {
    config: FirebaseConfig,
    client: Client,
    cache: Arc<dyn LocalCache>,
    current: RwLock<Option<Credential>>,
    state: watch::Sender<Option<AuthUser>>,
}

impl FirebaseAuth {
    /// Builds the provider; nobody is signed in until `restore` or a sign-in.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: FirebaseConfig, cache: Arc<dyn LocalCache>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .map_err(|err| ProviderError::Config(format!("Failed to build HTTP client: {err}")))?;
        let (state, _) = watch::channel(None);

        Ok(Self {
            config,
            client,
            cache,
            current: RwLock::new(None),
            state,
        })
    }

    fn persistence_key(&self) -> String {
        format!("firebase:authUser:{}", self.config.project_id)
    }

    /// Re-validates the persisted user, if any, and publishes the outcome.
    /// A revoked or expired credential signs the user out; a network failure
    /// keeps the persisted user so the client can work offline.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Option<AuthUser> {
        let persisted = self.load_persisted()?;
        let credential = Credential::from(persisted);

        match self.refresh(&credential.refresh_token).await {
            Ok(refreshed) => {
                let user = match self.lookup(&refreshed.id_token).await {
                    Ok(user) => user,
                    Err(err) => {
                        warn!("account lookup failed after refresh, keeping cached profile: {err}");
                        credential.user.clone()
                    }
                };
                debug!(uid = %user.uid, "persisted session re-validated");
                let user = self.establish(Credential {
                    user,
                    id_token: refreshed.id_token,
                    refresh_token: refreshed.refresh_token,
                });
                Some(user)
            }
            Err(ProviderError::Rejected(reason)) => {
                info!("persisted session is no longer valid: {reason}");
                self.drop_credential();
                None
            }
            Err(err) => {
                warn!("could not re-validate persisted session, using cached user: {err}");
                let user = self.establish(credential);
                Some(user)
            }
        }
    }

    /// Id token of the signed-in user, used to authorize document store writes.
    #[must_use]
    pub fn id_token(&self) -> Option<SecretString> {
        self.read_current().map(|credential| credential.id_token)
    }

    fn read_current(&self) -> Option<Credential> {
        match self.current.read() {
            Ok(current) => current.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn write_current(&self, credential: Option<Credential>) {
        match self.current.write() {
            Ok(mut current) => *current = credential,
            Err(poisoned) => *poisoned.into_inner() = credential,
        }
    }

    fn load_persisted(&self) -> Option<PersistedCredential> {
        let raw = match self.cache.get(&self.persistence_key()) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!("failed to read persisted credential: {err}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(persisted) => Some(persisted),
            Err(err) => {
                warn!("discarding malformed persisted credential: {err}");
                None
            }
        }
    }

    /// Records the credential, persists it and notifies subscribers.
    fn establish(&self, credential: Credential) -> AuthUser {
        let user = credential.user.clone();

        match serde_json::to_string(&PersistedCredential::from(&credential)) {
            Ok(raw) => {
                if let Err(err) = self.cache.set(&self.persistence_key(), &raw) {
                    warn!("failed to persist credential: {err}");
                }
            }
            Err(err) => warn!("failed to encode credential: {err}"),
        }

        self.write_current(Some(credential));
        self.state.send_replace(Some(user.clone()));
        user
    }

    fn drop_credential(&self) {
        if let Err(err) = self.cache.remove(&self.persistence_key()) {
            warn!("failed to remove persisted credential: {err}");
        }
        self.write_current(None);
        self.state.send_replace(None);
    }

    fn endpoint(&self, base: &str, path: &str) -> Result<Url, ProviderError> {
        let base = base.trim().trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/{}", path.trim_start_matches('/')))
            .map_err(|err| ProviderError::Config(format!("invalid endpoint URL: {err}")))?;
        url.query_pairs_mut()
            .append_pair("key", self.config.api_key.expose_secret());
        Ok(url)
    }

    fn accounts_endpoint(&self, method: &str) -> Result<Url, ProviderError> {
        self.endpoint(&self.config.auth_url, &format!("v1/accounts:{method}"))
    }

    async fn lookup(&self, id_token: &SecretString) -> Result<AuthUser, ProviderError> {
        let url = self.accounts_endpoint("lookup")?;
        let response = self
            .client
            .post(url)
            .json(&json!({ "idToken": id_token.expose_secret() }))
            .send()
            .await?;
        let lookup: LookupResponse = handle_json_response(response).await?;

        lookup
            .users
            .into_iter()
            .next()
            .map(AuthUser::from)
            .ok_or(ProviderError::NoCurrentUser)
    }

    async fn refresh(&self, refresh_token: &SecretString) -> Result<Credential, ProviderError> {
        let url = self.endpoint(&self.config.token_url, "v1/token")?;
        let response = self
            .client
            .post(url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.expose_secret()),
            ])
            .send()
            .await?;
        let refreshed: RefreshResponse = handle_json_response(response).await?;

        Ok(Credential {
            user: AuthUser {
                uid: refreshed.user_id,
                ..AuthUser::default()
            },
            id_token: SecretString::from(refreshed.id_token),
            refresh_token: SecretString::from(refreshed.refresh_token),
        })
    }

    /// Completes a sign-in: fills in profile fields the endpoint did not return,
    /// then records the credential.
    async fn complete_sign_in(&self, response: SignInResponse) -> AuthUser {
        let id_token = SecretString::from(response.id_token);
        let fallback = AuthUser {
            uid: response.local_id,
            email: response.email,
            display_name: response.display_name,
            photo_url: response.photo_url,
            email_verified: response.email_verified.unwrap_or(false),
        };

        let user = if response.email_verified.is_some() {
            fallback
        } else {
            match self.lookup(&id_token).await {
                Ok(user) => user,
                Err(err) => {
                    warn!("account lookup failed, using sign-in response: {err}");
                    fallback
                }
            }
        };

        self.establish(Credential {
            user,
            id_token,
            refresh_token: SecretString::from(response.refresh_token),
        })
    }

    async fn password_request(
        &self,
        method: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthUser, ProviderError> {
        let url = self.accounts_endpoint(method)?;
        let response = self
            .client
            .post(url)
            .json(&json!({
                "email": email,
                "password": password.expose_secret(),
                "returnSecureToken": true,
            }))
            .send()
            .await?;
        let signed_in: SignInResponse = handle_json_response(response).await?;

        Ok(self.complete_sign_in(signed_in).await)
    }

    async fn send_oob_code(&self, body: serde_json::Value) -> Result<(), ProviderError> {
        let url = self.accounts_endpoint("sendOobCode")?;
        let response = self.client.post(url).json(&body).send().await?;
        handle_empty_response(response).await
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthUser, ProviderError> {
        self.password_request("signInWithPassword", email, password)
            .await
    }

    #[instrument(skip(self, password))]
    async fn create_account(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthUser, ProviderError> {
        self.password_request("signUp", email, password).await
    }

    #[instrument(skip(self))]
    async fn send_password_reset_email(&self, email: &str) -> Result<(), ProviderError> {
        self.send_oob_code(json!({ "requestType": "PASSWORD_RESET", "email": email }))
            .await
    }

    #[instrument(skip(self))]
    async fn send_email_verification(&self) -> Result<(), ProviderError> {
        let id_token = self.id_token().ok_or(ProviderError::NoCurrentUser)?;
        self.send_oob_code(json!({
            "requestType": "VERIFY_EMAIL",
            "idToken": id_token.expose_secret(),
        }))
        .await
    }

    #[instrument(skip(self))]
    async fn sign_in_with_popup(&self, kind: ProviderKind) -> Result<AuthUser, ProviderError> {
        let token = self.config.idp_token.as_ref().ok_or_else(|| {
            ProviderError::Rejected(format!(
                "Sign-in with {kind} needs an identity provider token; no browser popup is available."
            ))
        })?;

        let post_body = form_urlencoded::Serializer::new(String::new())
            .append_pair(kind.token_param(), token.expose_secret())
            .append_pair("providerId", kind.provider_id())
            .finish();

        let url = self.accounts_endpoint("signInWithIdp")?;
        let response = self
            .client
            .post(url)
            .json(&json!({
                "postBody": post_body,
                "requestUri": IDP_REQUEST_URI,
                "returnIdpCredential": true,
                "returnSecureToken": true,
            }))
            .send()
            .await?;
        let signed_in: SignInResponse = handle_json_response(response).await?;

        Ok(self.complete_sign_in(signed_in).await)
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.drop_credential();
        Ok(())
    }

    fn subscribe(&self) -> AuthStateReceiver {
        self.state.subscribe()
    }
}
