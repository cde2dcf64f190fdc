use super::{
    guard::{AuthGuard, GuardDecision},
    routes::Destination,
};
use std::sync::RwLock;
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigationOutcome {
    Entered(Destination),
    /// The guard blocked `requested`; `showing` is what is displayed instead.
    Denied {
        requested: Destination,
        showing: Destination,
    },
}

impl NavigationOutcome {
    /// Destination displayed after the attempt.
    #[must_use]
    pub const fn showing(self) -> Destination {
        match self {
            Self::Entered(destination) | Self::Denied { showing: destination, .. } => destination,
        }
    }
}

/// Navigation surface the flows drive.
pub trait Navigator: Send + Sync {
    fn navigate(&self, destination: Destination) -> NavigationOutcome;

    fn current(&self) -> Option<Destination>;
}

/// In-process router enforcing the guard on every navigation.
pub struct AppRouter {
    guard: AuthGuard,
    current: RwLock<Option<Destination>>,
}

impl AppRouter {
    #[must_use]
    pub fn new(guard: AuthGuard) -> Self {
        Self {
            guard,
            current: RwLock::new(None),
        }
    }

    /// Resolves `path` and navigates; unknown paths fall back to the default view.
    pub fn navigate_path(&self, path: &str) -> NavigationOutcome {
        let destination = Destination::resolve(path).unwrap_or_else(|| {
            debug!(path, "no route matches, using default destination");
            Destination::DEFAULT
        });
        self.navigate(destination)
    }

    fn set_current(&self, destination: Destination) {
        match self.current.write() {
            Ok(mut current) => *current = Some(destination),
            Err(poisoned) => *poisoned.into_inner() = Some(destination),
        }
    }
}

impl Navigator for AppRouter {
    fn navigate(&self, destination: Destination) -> NavigationOutcome {
        match self.guard.can_activate(destination) {
            GuardDecision::Admit => {
                self.set_current(destination);
                info!(%destination, "navigated");
                NavigationOutcome::Entered(destination)
            }
            GuardDecision::Deny => {
                // Blocked navigations keep the current view; before anything was
                // shown, the default route applies.
                let showing = self.current().unwrap_or(Destination::DEFAULT);
                self.set_current(showing);
                NavigationOutcome::Denied {
                    requested: destination,
                    showing,
                }
            }
        }
    }

    fn current(&self) -> Option<Destination> {
        match self.current.read() {
            Ok(current) => *current,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
