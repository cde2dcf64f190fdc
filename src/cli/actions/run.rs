use crate::{
    auth::{CredentialForm, FlowOutcome},
    cli::actions::{
        app::{describe, App},
        Action, Flow,
    },
};
use anyhow::{bail, Result};

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the application cannot start or the flow fails.
pub async fn execute(action: Action) -> Result<()> {
    let app = App::boot(&action.globals, action.flow.entry_path()).await?;

    let outcome = match action.flow {
        Flow::Login { email, password } => Some(("login", app.auth.login(&email, &password).await)),
        Flow::Register { email, password } => {
            let mut form = CredentialForm::new(email, password);
            Some(("register", app.auth.register(&mut form).await))
        }
        Flow::ForgotPassword { email } => Some((
            "forgot-password",
            app.auth.forgot_password(&email).await,
        )),
        Flow::SocialLogin(kind) => Some(("social-login", app.auth.social_login(kind).await)),
        Flow::Logout => Some(("logout", app.auth.logout().await)),
        Flow::Status => {
            match app.auth.current_user() {
                Some(profile) => println!("{}", describe(&profile)),
                None => println!("not signed in"),
            }
            None
        }
        Flow::Open(_) => None,
    };

    app.render();
    app.shutdown().await;

    match outcome {
        Some((name, FlowOutcome::Failed)) => bail!("{name} failed"),
        _ => Ok(()),
    }
}
