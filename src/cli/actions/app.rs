//! The application root: owns the cache, the provider, the router and the one
//! session subscription for the lifetime of an invocation.

use crate::{
    auth::{AuthService, ConsoleNotifier},
    cli::globals::GlobalArgs,
    navigation::{AppRouter, AuthGuard, Destination, Navigator},
    provider::{
        firebase::{FirebaseAuth, Firestore},
        IdentityProvider,
    },
    session::{FileCache, LocalCache, SessionStore, SessionSubscription, UserProfile},
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

pub struct App {
    pub auth: AuthService,
    pub session: Arc<SessionStore>,
    pub router: Arc<AppRouter>,
    subscription: SessionSubscription,
}

impl App {
    /// Restores the session, lands on `entry_path` and subscribes to the
    /// provider. The subscription sees the restored state before this returns.
    ///
    /// # Errors
    /// Returns an error if the HTTP clients cannot be built.
    pub async fn boot(globals: &GlobalArgs, entry_path: &str) -> Result<Self> {
        debug!("Global args: {:?}", globals);

        let cache: Arc<dyn LocalCache> = Arc::new(FileCache::new(&globals.cache_path));
        let session = Arc::new(SessionStore::restore(cache.clone()));

        let config = globals.firebase_config();
        let provider = Arc::new(
            FirebaseAuth::new(config.clone(), cache).context("failed to set up identity provider")?,
        );
        provider.restore().await;

        let store = Arc::new(
            Firestore::new(&config, provider.clone()).context("failed to set up document store")?,
        );

        let router = Arc::new(AppRouter::new(AuthGuard::new(session.clone())));
        router.navigate_path(entry_path);

        let subscription =
            SessionSubscription::start(provider.subscribe(), session.clone(), router.clone());
        tokio::task::yield_now().await;

        let auth = AuthService::new(
            provider,
            store,
            session.clone(),
            router.clone(),
            Arc::new(ConsoleNotifier),
        )
        .with_collection(globals.collection.clone());

        Ok(Self {
            auth,
            session,
            router,
            subscription,
        })
    }

    /// Prints the view the router ended on.
    pub fn render(&self) {
        let view = self.router.current().unwrap_or(Destination::DEFAULT);
        match (view, self.session.cached_profile()) {
            (Destination::Dashboard, Some(profile)) => {
                println!("{view}: {}", describe(&profile));
            }
            _ => println!("{view}"),
        }
    }

    /// Waits for background work, then tears the subscription down.
    pub async fn shutdown(self) {
        self.auth.settle().await;
        self.subscription.shutdown().await;
    }
}

#[must_use]
pub fn describe(profile: &UserProfile) -> String {
    let who = profile
        .display_name
        .as_deref()
        .or(profile.email.as_deref())
        .unwrap_or(&profile.uid);
    let verified = if profile.email_verified {
        "verified"
    } else {
        "not verified"
    };
    format!("signed in as {who} (uid {}, email {verified})", profile.uid)
}
