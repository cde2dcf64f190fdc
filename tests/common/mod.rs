#![allow(dead_code)]

use async_trait::async_trait;
use authgate::{
    auth::{AuthService, CollectingNotifier},
    errors::{ProviderError, StoreError},
    navigation::{AppRouter, AuthGuard, Destination, NavigationOutcome, Navigator},
    provider::{AuthStateReceiver, AuthUser, DocumentStore, IdentityProvider, ProviderKind},
    session::{MemoryCache, SessionStore, SessionSubscription},
};
use secrecy::SecretString;
use serde_json::{Map, Value};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};
use tokio::sync::watch;

/// Ordered record of side effects shared by the fakes.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().map(|events| events.clone()).unwrap_or_default()
}

fn push(log: &EventLog, event: String) {
    if let Ok(mut events) = log.lock() {
        events.push(event);
    }
}

pub fn user(uid: &str, email: &str) -> AuthUser {
    AuthUser {
        uid: uid.to_string(),
        email: Some(email.to_string()),
        display_name: None,
        photo_url: None,
        email_verified: false,
    }
}

/// Identity provider that accepts everything unless told to fail.
pub struct FakeProvider {
    state: watch::Sender<Option<AuthUser>>,
    failure: Mutex<Option<ProviderError>>,
    sign_out_failure: Mutex<Option<ProviderError>>,
    pub verification_emails: AtomicUsize,
    pub reset_emails: Mutex<Vec<String>>,
    log: EventLog,
}

impl FakeProvider {
    pub fn new(log: EventLog) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            state,
            failure: Mutex::new(None),
            sign_out_failure: Mutex::new(None),
            verification_emails: AtomicUsize::new(0),
            reset_emails: Mutex::new(Vec::new()),
            log,
        }
    }

    /// Every later call fails with `err`.
    pub fn fail_with(&self, err: ProviderError) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some(err);
        }
    }

    pub fn fail_sign_out_with(&self, err: ProviderError) {
        if let Ok(mut failure) = self.sign_out_failure.lock() {
            *failure = Some(err);
        }
    }

    /// Emits a notification as if the provider state changed on its own.
    pub fn emit(&self, user: Option<AuthUser>) {
        self.state.send_replace(user);
    }

    pub fn subscribers(&self) -> usize {
        self.state.receiver_count()
    }

    fn check(&self, call: &str) -> Result<(), ProviderError> {
        push(&self.log, format!("provider {call}"));
        match self.failure.lock() {
            Ok(failure) => failure.clone().map_or(Ok(()), Err),
            Err(_) => Ok(()),
        }
    }

    fn sign_in(&self, user: AuthUser) -> AuthUser {
        self.state.send_replace(Some(user.clone()));
        user
    }
}

fn uid_for(email: &str) -> String {
    format!("uid-{}", email.split('@').next().unwrap_or_default())
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        _password: &SecretString,
    ) -> Result<AuthUser, ProviderError> {
        self.check("sign_in_with_password")?;
        Ok(self.sign_in(user(&uid_for(email), email)))
    }

    async fn create_account(
        &self,
        email: &str,
        _password: &SecretString,
    ) -> Result<AuthUser, ProviderError> {
        self.check("create_account")?;
        Ok(self.sign_in(user(&uid_for(email), email)))
    }

    async fn send_password_reset_email(&self, email: &str) -> Result<(), ProviderError> {
        self.check("send_password_reset_email")?;
        if let Ok(mut sent) = self.reset_emails.lock() {
            sent.push(email.to_string());
        }
        Ok(())
    }

    async fn send_email_verification(&self) -> Result<(), ProviderError> {
        tokio::task::yield_now().await;
        if self.state.borrow().is_none() {
            return Err(ProviderError::NoCurrentUser);
        }
        self.verification_emails.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn sign_in_with_popup(&self, kind: ProviderKind) -> Result<AuthUser, ProviderError> {
        self.check("sign_in_with_popup")?;
        let mut social = user(&format!("{kind}-user"), &format!("{kind}@x.com"));
        social.display_name = Some(format!("{kind} user"));
        social.email_verified = true;
        Ok(self.sign_in(social))
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        push(&self.log, "provider sign_out".to_string());
        self.state.send_replace(None);
        match self.sign_out_failure.lock() {
            Ok(failure) => failure.clone().map_or(Ok(()), Err),
            Err(_) => Ok(()),
        }
    }

    fn subscribe(&self) -> AuthStateReceiver {
        self.state.subscribe()
    }
}

/// Document store keeping upserts in memory with merge semantics. It notes
/// which view was showing when each write completed.
pub struct FakeStore {
    pub documents: Mutex<Map<String, Value>>,
    failure: Mutex<Option<StoreError>>,
    suspend: AtomicBool,
    router: Arc<AppRouter>,
    views_at_upsert: Mutex<Vec<Option<Destination>>>,
    log: EventLog,
}

impl FakeStore {
    pub fn new(log: EventLog, router: Arc<AppRouter>) -> Self {
        Self {
            documents: Mutex::new(Map::new()),
            failure: Mutex::new(None),
            suspend: AtomicBool::new(false),
            router,
            views_at_upsert: Mutex::new(Vec::new()),
            log,
        }
    }

    /// Makes every later upsert yield to the runtime before it completes,
    /// the way a network write would.
    pub fn suspend_upserts(&self) {
        self.suspend.store(true, Ordering::SeqCst);
    }

    pub fn views_at_upsert(&self) -> Vec<Option<Destination>> {
        self.views_at_upsert
            .lock()
            .map(|views| views.clone())
            .unwrap_or_default()
    }

    pub fn fail_with(&self, err: StoreError) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some(err);
        }
    }

    pub fn document(&self, collection: &str, key: &str) -> Option<Value> {
        self.documents
            .lock()
            .ok()
            .and_then(|documents| documents.get(&format!("{collection}/{key}")).cloned())
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn upsert_merge(
        &self,
        collection: &str,
        key: &str,
        record: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        push(&self.log, format!("upsert {collection}/{key}"));
        if self.suspend.load(Ordering::SeqCst) {
            for _ in 0..4 {
                tokio::task::yield_now().await;
            }
        }
        if let Ok(mut views) = self.views_at_upsert.lock() {
            views.push(self.router.current());
        }
        if let Some(err) = self.failure.lock().ok().and_then(|failure| failure.clone()) {
            return Err(err);
        }

        if let Ok(mut documents) = self.documents.lock() {
            let entry = documents
                .entry(format!("{collection}/{key}"))
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(fields) = entry {
                for (name, value) in record {
                    fields.insert(name.clone(), value.clone());
                }
            }
        }
        Ok(())
    }
}

/// Router wrapper logging every navigation into the shared event log.
pub struct RecordingNavigator {
    inner: Arc<AppRouter>,
    log: EventLog,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, destination: Destination) -> NavigationOutcome {
        push(&self.log, format!("navigate {destination}"));
        self.inner.navigate(destination)
    }

    fn current(&self) -> Option<Destination> {
        self.inner.current()
    }
}

/// Everything a flow test needs, wired the way the application root wires it.
pub struct Harness {
    pub log: EventLog,
    pub cache: Arc<MemoryCache>,
    pub session: Arc<SessionStore>,
    pub router: Arc<AppRouter>,
    pub provider: Arc<FakeProvider>,
    pub store: Arc<FakeStore>,
    pub notifier: Arc<CollectingNotifier>,
    pub auth: AuthService,
    pub subscription: Option<SessionSubscription>,
}

impl Harness {
    /// Builds the harness on `entry`, with the session subscription running.
    pub async fn start(entry: Destination) -> Self {
        let harness = Self::without_subscription(entry);
        let subscription = SessionSubscription::start(
            harness.provider.subscribe(),
            harness.session.clone(),
            harness.router.clone(),
        );
        tokio::task::yield_now().await;
        Self {
            subscription: Some(subscription),
            ..harness
        }
    }

    pub fn without_subscription(entry: Destination) -> Self {
        let log = EventLog::default();
        let cache = Arc::new(MemoryCache::new());
        let session = Arc::new(SessionStore::restore(cache.clone()));
        let router = Arc::new(AppRouter::new(AuthGuard::new(session.clone())));
        router.navigate(entry);

        let provider = Arc::new(FakeProvider::new(log.clone()));
        let store = Arc::new(FakeStore::new(log.clone(), router.clone()));
        let notifier = Arc::new(CollectingNotifier::new());
        let navigator = Arc::new(RecordingNavigator {
            inner: router.clone(),
            log: log.clone(),
        });

        let auth = AuthService::new(
            provider.clone(),
            store.clone(),
            session.clone(),
            navigator,
            notifier.clone(),
        );

        Self {
            log,
            cache,
            session,
            router,
            provider,
            store,
            notifier,
            auth,
            subscription: None,
        }
    }

    pub fn events(&self) -> Vec<String> {
        events(&self.log)
    }

    pub async fn shutdown(self) {
        self.auth.settle().await;
        if let Some(subscription) = self.subscription {
            subscription.shutdown().await;
        }
    }
}
