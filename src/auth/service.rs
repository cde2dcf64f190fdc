use super::{
    forms::CredentialForm,
    notifier::{Notice, Notifier},
};
use crate::{
    errors::{ProviderError, StoreError},
    navigation::{Destination, Navigator},
    provider::{AuthStateReceiver, AuthUser, DocumentStore, IdentityProvider, ProviderKind},
    session::{SessionState, SessionStore, UserProfile},
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

/// Collection the profile records live in.
pub const USERS_COLLECTION: &str = "users";

pub const RESET_EMAIL_SENT: &str = "Password reset email sent, check your inbox.";

/// Result of a flow. Failures have already been shown to the user.
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowOutcome {
    Completed,
    Failed,
}

impl FlowOutcome {
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Authentication flows. Each one delegates to the identity provider, mirrors
/// the resulting profile into the document store, then navigates. A flow holds
/// the session's flow guard throughout, so the subscription never navigates
/// ahead of it.
pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    auth_state: Mutex<AuthStateReceiver>,
    collection: String,
    background: Mutex<JoinSet<()>>,
}

impl AuthService {
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let auth_state = Mutex::new(provider.subscribe());
        Self {
            provider,
            store,
            session,
            navigator,
            notifier,
            auth_state,
            collection: USERS_COLLECTION.to_string(),
            background: Mutex::new(JoinSet::new()),
        }
    }

    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> FlowOutcome {
        if email.trim().is_empty() || password.expose_secret().trim().is_empty() {
            self.reject("Email and password are required.");
            return FlowOutcome::Failed;
        }

        let _flow = self.session.begin_flow();
        match self.provider.sign_in_with_password(email.trim(), password).await {
            Ok(user) => {
                self.sync_session();
                self.upsert_profile(&user).await;
                self.navigator.navigate(Destination::Dashboard);
                info!(uid = %user.uid, "signed in");
                FlowOutcome::Completed
            }
            Err(err) => self.surface(&err),
        }
    }

    /// Creates the account. The form is cleared when the provider refuses.
    #[instrument(skip_all, fields(email = %form.email))]
    pub async fn register(&self, form: &mut CredentialForm) -> FlowOutcome {
        if let Err(message) = form.validate() {
            self.reject(&message);
            return FlowOutcome::Failed;
        }

        let email = form.email.trim().to_string();
        let _flow = self.session.begin_flow();
        match self.provider.create_account(&email, &form.password).await {
            Ok(user) => {
                self.sync_session();
                self.send_verification_in_background();
                self.upsert_profile(&user).await;
                self.navigator.navigate(Destination::VerifyEmail);
                info!(uid = %user.uid, "account created");
                FlowOutcome::Completed
            }
            Err(err) => {
                form.clear();
                self.surface(&err)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> FlowOutcome {
        if email.trim().is_empty() {
            self.reject("Email is required.");
            return FlowOutcome::Failed;
        }

        match self.provider.send_password_reset_email(email.trim()).await {
            Ok(()) => {
                self.notifier.notify(Notice::Info(RESET_EMAIL_SENT.to_string()));
                self.navigator.navigate(Destination::Login);
                FlowOutcome::Completed
            }
            Err(err) => self.surface(&err),
        }
    }

    #[instrument(skip(self))]
    pub async fn social_login(&self, kind: ProviderKind) -> FlowOutcome {
        let _flow = self.session.begin_flow();
        match self.provider.sign_in_with_popup(kind).await {
            Ok(user) => {
                self.sync_session();
                self.upsert_profile(&user).await;
                self.navigator.navigate(Destination::Dashboard);
                info!(uid = %user.uid, provider = %kind, "signed in");
                FlowOutcome::Completed
            }
            Err(err) => self.surface(&err),
        }
    }

    /// Signs out. The local session is cleared even when the provider call
    /// fails; the failure is still shown.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> FlowOutcome {
        let _flow = self.session.begin_flow();
        let result = self.provider.sign_out().await;

        self.sync_session();
        self.session.clear();
        self.navigator.navigate(Destination::Login);

        match result {
            Ok(()) => {
                info!("signed out");
                FlowOutcome::Completed
            }
            Err(err) => self.surface(&err),
        }
    }

    /// Profile of the signed-in user, as the cache holds it.
    #[must_use]
    pub fn current_user(&self) -> Option<UserProfile> {
        self.session.cached_profile()
    }

    /// Waits for fire-and-forget work (verification emails) to finish.
    pub async fn settle(&self) {
        let mut pending = std::mem::take(&mut *lock(&self.background));
        while let Some(joined) = pending.join_next().await {
            if let Err(err) = joined {
                warn!("background task failed: {err}");
            }
        }
    }

    /// Applies the provider's latest notification to the store, so the guard
    /// sees the new state before the flow navigates.
    fn sync_session(&self) {
        let user = lock(&self.auth_state).borrow_and_update().clone();
        self.session
            .on_auth_state_changed(&SessionState::from_notification(user.as_ref()));
    }

    fn send_verification_in_background(&self) {
        let provider = self.provider.clone();
        let notifier = self.notifier.clone();
        lock(&self.background).spawn(async move {
            match provider.send_email_verification().await {
                Ok(()) => debug!("verification email sent"),
                Err(err) => {
                    warn!("failed to send verification email: {err}");
                    notifier.notify(Notice::Error(format!(
                        "Could not send the verification email: {err}"
                    )));
                }
            }
        });
    }

    async fn upsert_profile(&self, user: &AuthUser) {
        let Some(profile) = UserProfile::from_user(user) else {
            warn!("provider returned a user without uid, skipping profile upsert");
            return;
        };

        let result = match profile_record(&profile) {
            Ok(record) => {
                self.store
                    .upsert_merge(&self.collection, &profile.uid, &record)
                    .await
            }
            Err(err) => Err(err),
        };

        if let Err(err) = result {
            warn!(uid = %profile.uid, "failed to upsert profile record: {err}");
        }
    }

    fn reject(&self, message: &str) {
        self.notifier.notify(Notice::Error(message.to_string()));
    }

    fn surface(&self, err: &ProviderError) -> FlowOutcome {
        debug!("flow failed: {err}");
        self.notifier.notify(Notice::Error(err.to_string()));
        FlowOutcome::Failed
    }
}

/// Field map written to the document store. Anything but a JSON object would
/// turn the merge into a full overwrite, so it is refused.
fn profile_record(profile: &UserProfile) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(profile) {
        Ok(Value::Object(record)) if !record.is_empty() => Ok(record),
        Ok(_) | Err(_) => Err(StoreError::InvalidRecord),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
