//! Authentication Flows. Failures are shown through the [`Notifier`] and never
//! retried.

pub mod forms;
pub mod notifier;
pub mod service;

pub use forms::CredentialForm;
pub use notifier::{CollectingNotifier, ConsoleNotifier, Notice, Notifier};
pub use service::{AuthService, FlowOutcome, RESET_EMAIL_SENT, USERS_COLLECTION};
