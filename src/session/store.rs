use super::{
    cache::LocalCache,
    state::{SessionState, UserProfile},
};
use crate::errors::CacheError;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, RwLock,
};
use tracing::{debug, warn};

/// Cache key holding the serialized session snapshot.
pub const SESSION_KEY: &str = "user";
/// Literal stored when the provider reports no user.
pub const ABSENT_MARKER: &str = "null";

/// Last-known authentication state, mirrored into a local cache.
pub struct SessionStore {
    cache: Arc<dyn LocalCache>,
    current: RwLock<SessionState>,
    flows: AtomicUsize,
}

/// Held by a flow that owns navigation; released on drop.
#[must_use]
pub struct FlowGuard<'a> {
    flows: &'a AtomicUsize,
}

impl Drop for FlowGuard<'_> {
    fn drop(&mut self) {
        self.flows.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SessionStore {
    /// Creates the store at application start from whatever the cache holds.
    #[must_use]
    pub fn restore(cache: Arc<dyn LocalCache>) -> Self {
        let current = read_profile(cache.as_ref())
            .map_or(SessionState::Anonymous, SessionState::Authenticated);
        debug!(authenticated = current.is_authenticated(), "session restored from cache");

        Self {
            cache,
            current: RwLock::new(current),
            flows: AtomicUsize::new(0),
        }
    }

    /// Applies a state-change notification. Cache writes are best-effort.
    pub fn on_auth_state_changed(&self, state: &SessionState) {
        let written = match state {
            SessionState::Authenticated(profile) => serde_json::to_string(profile)
                .map_err(CacheError::from)
                .and_then(|value| self.cache.set(SESSION_KEY, &value)),
            SessionState::Anonymous => self.cache.set(SESSION_KEY, ABSENT_MARKER),
        };
        if let Err(err) = written {
            warn!("failed to mirror session state into cache: {err}");
        }

        self.replace(state.clone());
    }

    /// True when the cache holds a well-formed profile. Never touches the network.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        read_profile(self.cache.as_ref()).is_some()
    }

    /// Profile currently held by the cache, if any.
    #[must_use]
    pub fn cached_profile(&self) -> Option<UserProfile> {
        read_profile(self.cache.as_ref())
    }

    /// In-memory state as of the last notification.
    #[must_use]
    pub fn current(&self) -> SessionState {
        match self.current.read() {
            Ok(current) => current.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Marks a flow as running until the guard drops. While any flow runs it
    /// decides where to navigate and notifications only update the store.
    pub fn begin_flow(&self) -> FlowGuard<'_> {
        self.flows.fetch_add(1, Ordering::SeqCst);
        FlowGuard { flows: &self.flows }
    }

    #[must_use]
    pub fn flow_in_progress(&self) -> bool {
        self.flows.load(Ordering::SeqCst) > 0
    }

    /// Drops the cache entry on explicit sign-out.
    pub fn clear(&self) {
        if let Err(err) = self.cache.remove(SESSION_KEY) {
            warn!("failed to remove session from cache: {err}");
        }
        self.replace(SessionState::Anonymous);
    }

    fn replace(&self, state: SessionState) {
        match self.current.write() {
            Ok(mut current) => *current = state,
            Err(poisoned) => *poisoned.into_inner() = state,
        }
    }
}

/// Reads the cached snapshot; absence, `null` and corruption all mean logged out.
fn read_profile(cache: &dyn LocalCache) -> Option<UserProfile> {
    let raw = match cache.get(SESSION_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            warn!("session cache unreadable, treating as logged out: {err}");
            return None;
        }
    };

    let raw = raw.trim();
    if raw.is_empty() || raw == ABSENT_MARKER {
        return None;
    }

    match serde_json::from_str::<Option<UserProfile>>(raw) {
        Ok(profile) => profile.filter(|profile| !profile.uid.trim().is_empty()),
        Err(err) => {
            warn!("malformed session cache entry, treating as logged out: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::cache::MemoryCache;
    use anyhow::Result;

    fn profile(uid: &str) -> UserProfile {
        UserProfile {
            uid: uid.to_string(),
            email: Some("a@x.com".to_string()),
            display_name: None,
            photo_url: None,
            email_verified: false,
        }
    }

    fn store() -> (Arc<MemoryCache>, SessionStore) {
        let cache = Arc::new(MemoryCache::new());
        let store = SessionStore::restore(cache.clone());
        (cache, store)
    }

    #[test]
    fn authenticated_notification_serializes_profile() -> Result<()> {
        let (cache, store) = store();
        store.on_auth_state_changed(&SessionState::Authenticated(profile("u1")));

        let raw = cache.get(SESSION_KEY)?.unwrap_or_default();
        let cached: UserProfile = serde_json::from_str(&raw)?;
        assert_eq!(cached.uid, "u1");
        assert!(store.is_logged_in());
        assert!(store.current().is_authenticated());
        Ok(())
    }

    #[test]
    fn anonymous_notification_writes_absent_marker() -> Result<()> {
        let (cache, store) = store();
        store.on_auth_state_changed(&SessionState::Authenticated(profile("u1")));
        store.on_auth_state_changed(&SessionState::Anonymous);

        assert_eq!(cache.get(SESSION_KEY)?, Some(ABSENT_MARKER.to_string()));
        assert!(!store.is_logged_in());
        assert_eq!(store.current(), SessionState::Anonymous);
        Ok(())
    }

    #[test]
    fn is_logged_in_follows_latest_notification() {
        let (_cache, store) = store();
        let sequence = [
            Some("u1"),
            None,
            Some("u2"),
            Some("u3"),
            None,
            None,
            Some("u4"),
        ];

        for step in sequence {
            let state = step.map_or(SessionState::Anonymous, |uid| {
                SessionState::Authenticated(profile(uid))
            });
            store.on_auth_state_changed(&state);
            assert_eq!(store.is_logged_in(), step.is_some());
            assert_eq!(
                store.cached_profile().map(|p| p.uid),
                step.map(ToString::to_string)
            );
        }
    }

    #[test]
    fn malformed_cache_content_reads_as_logged_out() -> Result<()> {
        let (cache, store) = store();
        for raw in ["", "   ", "null", "{", "42", r#"{"uid": 7}"#, r#"{"uid":""}"#, "[]"] {
            cache.set(SESSION_KEY, raw)?;
            assert!(!store.is_logged_in(), "{raw:?} should read as logged out");
        }
        Ok(())
    }

    #[test]
    fn restore_reads_existing_cache_entry() -> Result<()> {
        let cache = Arc::new(MemoryCache::new());
        cache.set(SESSION_KEY, &serde_json::to_string(&profile("u9"))?)?;

        let store = SessionStore::restore(cache);
        assert_eq!(
            store.current().profile().map(|p| p.uid.clone()),
            Some("u9".to_string())
        );
        assert!(store.is_logged_in());
        Ok(())
    }

    #[test]
    fn flow_guard_is_released_on_drop() {
        let (_cache, store) = store();
        assert!(!store.flow_in_progress());

        let outer = store.begin_flow();
        let inner = store.begin_flow();
        drop(inner);
        assert!(store.flow_in_progress());
        drop(outer);
        assert!(!store.flow_in_progress());
    }

    #[test]
    fn clear_removes_the_entry() -> Result<()> {
        let (cache, store) = store();
        store.on_auth_state_changed(&SessionState::Authenticated(profile("u1")));
        store.clear();

        assert_eq!(cache.get(SESSION_KEY)?, None);
        assert!(!store.is_logged_in());
        Ok(())
    }
}
