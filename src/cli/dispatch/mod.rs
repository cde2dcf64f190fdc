//! Maps validated CLI matches to an [`Action`].

use crate::cli::{
    actions::{Action, Flow},
    commands::{self, firebase, storage},
    globals::GlobalArgs,
};
use crate::provider::ProviderKind;
use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use secrecy::SecretString;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let firebase_opts = firebase::Options::parse(matches)?;
    let storage_opts = storage::Options::parse(matches)?;

    let mut globals = GlobalArgs::new(
        firebase_opts.api_key,
        firebase_opts.project_id,
        storage_opts.cache_path,
    );
    globals.auth_url = firebase_opts.auth_url;
    globals.token_url = firebase_opts.token_url;
    globals.firestore_url = firebase_opts.firestore_url;
    globals.idp_token = firebase_opts.idp_token;
    globals.collection = storage_opts.collection;

    let flow = flow(matches)?;
    Ok(Action { globals, flow })
}

fn flow(matches: &ArgMatches) -> Result<Flow> {
    let read = |sub: &ArgMatches, id: &str| -> Result<String> {
        sub.get_one::<String>(id)
            .cloned()
            .context(format!("missing required argument: --{id}"))
    };

    match matches.subcommand() {
        Some((commands::CMD_LOGIN, sub)) => Ok(Flow::Login {
            email: read(sub, "email")?,
            password: SecretString::from(read(sub, "password")?),
        }),
        Some((commands::CMD_REGISTER, sub)) => Ok(Flow::Register {
            email: read(sub, "email")?,
            password: SecretString::from(read(sub, "password")?),
        }),
        Some((commands::CMD_FORGOT_PASSWORD, sub)) => Ok(Flow::ForgotPassword {
            email: read(sub, "email")?,
        }),
        Some((commands::CMD_SOCIAL_LOGIN, sub)) => {
            let kind = read(sub, "provider")?
                .parse::<ProviderKind>()
                .map_err(|e| anyhow!(e))?;
            Ok(Flow::SocialLogin(kind))
        }
        Some((commands::CMD_LOGOUT, _)) => Ok(Flow::Logout),
        Some((commands::CMD_STATUS, _)) => Ok(Flow::Status),
        Some((commands::CMD_OPEN, sub)) => Ok(Flow::Open(
            sub.get_one::<String>("path")
                .cloned()
                .unwrap_or_else(|| "/".to_string()),
        )),
        Some((other, _)) => Err(anyhow!("unknown command: {other}")),
        None => Err(anyhow!("no command given")),
    }
}
