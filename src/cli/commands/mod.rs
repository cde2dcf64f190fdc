pub mod firebase;
pub mod logging;
pub mod storage;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const CMD_LOGIN: &str = "login";
pub const CMD_REGISTER: &str = "register";
pub const CMD_FORGOT_PASSWORD: &str = "forgot-password";
pub const CMD_SOCIAL_LOGIN: &str = "social-login";
pub const CMD_LOGOUT: &str = "logout";
pub const CMD_STATUS: &str = "status";
pub const CMD_OPEN: &str = "open";

fn email_arg() -> Arg {
    Arg::new("email")
        .short('e')
        .long("email")
        .help("Account email address")
        .env("AUTHGATE_EMAIL")
        .required(true)
}

fn password_arg() -> Arg {
    Arg::new("password")
        .short('p')
        .long("password")
        .help("Account password")
        .env("AUTHGATE_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

fn subcommands() -> [Command; 7] {
    [
        Command::new(CMD_LOGIN)
            .about("Sign in with email and password")
            .arg(email_arg())
            .arg(password_arg()),
        Command::new(CMD_REGISTER)
            .about("Create an account and send the verification email")
            .arg(email_arg())
            .arg(password_arg()),
        Command::new(CMD_FORGOT_PASSWORD)
            .about("Send a password reset email")
            .arg(email_arg()),
        Command::new(CMD_SOCIAL_LOGIN)
            .about("Sign in through a federated identity provider")
            .arg(
                Arg::new("provider")
                    .help("Identity provider")
                    .value_parser(["google", "github", "facebook"])
                    .required(true),
            ),
        Command::new(CMD_LOGOUT).about("Sign out and clear the local session"),
        Command::new(CMD_STATUS).about("Show the cached session"),
        Command::new(CMD_OPEN)
            .about("Navigate to a view, e.g. /dashboard")
            .arg(Arg::new("path").help("View path").default_value("/")),
    ]
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("authgate")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommands(subcommands());

    let command = firebase::with_args(command);
    let command = storage::with_args(command);
    logging::with_args(command)
}
