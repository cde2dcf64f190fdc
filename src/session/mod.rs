//! Session Store: the client's last-known authentication state. It is mutated
//! only by provider notifications (and removed on explicit sign-out) and is
//! persisted to a synchronous local cache so it survives restarts.

pub mod cache;
pub mod state;
pub mod store;
pub mod subscription;

pub use cache::{FileCache, LocalCache, MemoryCache};
pub use state::{SessionState, UserProfile};
pub use store::{FlowGuard, SessionStore, ABSENT_MARKER, SESSION_KEY};
pub use subscription::SessionSubscription;
