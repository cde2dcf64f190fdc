//! The single long-lived listener on provider notifications. It is registered
//! once at startup by the application root, which owns the handle and calls
//! `shutdown` on teardown.

use super::{state::SessionState, store::SessionStore};
use crate::{
    navigation::{Destination, Navigator},
    provider::{AuthStateReceiver, AuthUser},
};
use std::sync::Arc;
use tokio::{sync::oneshot, task::JoinHandle};
use tracing::{debug, warn};

pub struct SessionSubscription {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SessionSubscription {
    /// Spawns the listener. The receiver's current value is applied first, the
    /// way the provider reports the initial state to a new subscriber.
    #[must_use]
    pub fn start(
        receiver: AuthStateReceiver,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (stop, stopped) = oneshot::channel();
        let task = tokio::spawn(listen(receiver, session, navigator, stopped));
        Self { stop, task }
    }

    /// Stops listening and waits for the task to finish.
    pub async fn shutdown(self) {
        let _ = self.stop.send(());
        if let Err(err) = self.task.await {
            warn!("session subscription ended abnormally: {err}");
        }
        debug!("session subscription closed");
    }
}

async fn listen(
    mut receiver: AuthStateReceiver,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    mut stopped: oneshot::Receiver<()>,
) {
    let initial = receiver.borrow_and_update().clone();
    apply_notification(initial.as_ref(), &session, navigator.as_ref());

    loop {
        tokio::select! {
            _ = &mut stopped => break,
            changed = receiver.changed() => {
                if changed.is_err() {
                    debug!("identity provider dropped its notification channel");
                    break;
                }
                let user = receiver.borrow_and_update().clone();
                apply_notification(user.as_ref(), &session, navigator.as_ref());
            }
        }
    }
}

/// Mirrors one notification into the store. A signed-in user is sent to the
/// dashboard unless the verification-pending view is showing or a flow is
/// running; a flow navigates once its own work is done.
pub(crate) fn apply_notification(
    user: Option<&AuthUser>,
    session: &SessionStore,
    navigator: &dyn Navigator,
) {
    let state = SessionState::from_notification(user);
    debug!(authenticated = state.is_authenticated(), "auth state changed");
    session.on_auth_state_changed(&state);

    if state.is_authenticated()
        && !session.flow_in_progress()
        && !matches!(
            navigator.current(),
            Some(Destination::VerifyEmail | Destination::Dashboard)
        )
    {
        navigator.navigate(Destination::Dashboard);
    }
}
