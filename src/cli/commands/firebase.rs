use crate::provider::firebase::{DEFAULT_AUTH_URL, DEFAULT_FIRESTORE_URL, DEFAULT_TOKEN_URL};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_API_KEY: &str = "api-key";
pub const ARG_PROJECT_ID: &str = "project-id";
pub const ARG_AUTH_URL: &str = "auth-url";
pub const ARG_TOKEN_URL: &str = "token-url";
pub const ARG_FIRESTORE_URL: &str = "firestore-url";
pub const ARG_IDP_TOKEN: &str = "idp-token";

#[derive(Debug)]
pub struct Options {
    pub api_key: SecretString,
    pub project_id: String,
    pub auth_url: String,
    pub token_url: String,
    pub firestore_url: String,
    pub idp_token: Option<SecretString>,
}

impl Options {
    /// Parse Firebase arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the API key or project id is missing or blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let read_required = |id: &str| -> anyhow::Result<String> {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
        };
        let read_url = |id: &str, default: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            api_key: SecretString::from(read_required(ARG_API_KEY)?),
            project_id: read_required(ARG_PROJECT_ID)?,
            auth_url: read_url(ARG_AUTH_URL, DEFAULT_AUTH_URL),
            token_url: read_url(ARG_TOKEN_URL, DEFAULT_TOKEN_URL),
            firestore_url: read_url(ARG_FIRESTORE_URL, DEFAULT_FIRESTORE_URL),
            idp_token: matches
                .get_one::<String>(ARG_IDP_TOKEN)
                .filter(|v| !v.trim().is_empty())
                .map(|v| SecretString::from(v.clone())),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_KEY)
                .long(ARG_API_KEY)
                .help("Firebase Web API key")
                .env("AUTHGATE_API_KEY")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new(ARG_PROJECT_ID)
                .long(ARG_PROJECT_ID)
                .help("Firebase project id")
                .env("AUTHGATE_PROJECT_ID")
                .global(true),
        )
        .arg(
            Arg::new(ARG_AUTH_URL)
                .long(ARG_AUTH_URL)
                .help("Identity Toolkit base URL")
                .env("AUTHGATE_AUTH_URL")
                .default_value(DEFAULT_AUTH_URL)
                .global(true),
        )
        .arg(
            Arg::new(ARG_TOKEN_URL)
                .long(ARG_TOKEN_URL)
                .help("Secure Token base URL")
                .env("AUTHGATE_TOKEN_URL")
                .default_value(DEFAULT_TOKEN_URL)
                .global(true),
        )
        .arg(
            Arg::new(ARG_FIRESTORE_URL)
                .long(ARG_FIRESTORE_URL)
                .help("Firestore base URL")
                .env("AUTHGATE_FIRESTORE_URL")
                .default_value(DEFAULT_FIRESTORE_URL)
                .global(true),
        )
        .arg(
            Arg::new(ARG_IDP_TOKEN)
                .long(ARG_IDP_TOKEN)
                .help("Identity provider token (Google id token, GitHub or Facebook access token) used by social-login")
                .env("AUTHGATE_IDP_TOKEN")
                .hide_env_values(true)
                .global(true),
        )
}
