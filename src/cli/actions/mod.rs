pub mod app;

// Internal "interpreter" for `Action`, kept apart so this module stays small.
mod run;

use crate::{cli::globals::GlobalArgs, navigation::Destination, provider::ProviderKind};
use secrecy::SecretString;

/// What one invocation does, after global settings have been resolved.
#[derive(Debug)]
pub enum Flow {
    Login { email: String, password: SecretString },
    Register { email: String, password: SecretString },
    ForgotPassword { email: String },
    SocialLogin(ProviderKind),
    Logout,
    Status,
    Open(String),
}

impl Flow {
    /// View the invocation starts on, the way a page load starts on a route.
    #[must_use]
    pub fn entry_path(&self) -> &str {
        match self {
            Self::Login { .. } | Self::SocialLogin(_) => Destination::Login.path(),
            Self::Register { .. } => Destination::Register.path(),
            Self::ForgotPassword { .. } => Destination::ForgotPassword.path(),
            Self::Logout => Destination::Dashboard.path(),
            Self::Status => "/",
            Self::Open(path) => path,
        }
    }
}

#[derive(Debug)]
pub struct Action {
    pub globals: GlobalArgs,
    pub flow: Flow,
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the application cannot start or the flow fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
