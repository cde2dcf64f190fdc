//! Navigation Policy and the in-process router. The guard reads the Session
//! Store on every attempt; a denied navigation is silent and leaves the router
//! on its current (or default) view.

pub mod guard;
pub mod router;
pub mod routes;

pub use guard::{AuthGuard, GuardDecision};
pub use router::{AppRouter, NavigationOutcome, Navigator};
pub use routes::Destination;
