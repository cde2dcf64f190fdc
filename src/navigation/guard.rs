use super::routes::Destination;
use crate::session::SessionStore;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Admit,
    Deny,
}

/// Navigation policy for protected views. UX only: real access control has to
/// live with the services holding the data.
#[derive(Clone)]
pub struct AuthGuard {
    session: Arc<SessionStore>,
}

impl AuthGuard {
    #[must_use]
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    /// Evaluated on every attempt; nothing is remembered between calls.
    #[must_use]
    pub fn can_activate(&self, destination: Destination) -> GuardDecision {
        if !destination.is_protected() || self.session.is_logged_in() {
            return GuardDecision::Admit;
        }

        debug!(%destination, "navigation denied: not signed in");
        GuardDecision::Deny
    }
}
