//! # Authgate (client-side session manager)
//!
//! `authgate` keeps a client's belief about who is signed in, decides whether a
//! protected view may be entered, and runs the thin authentication flows that
//! sit on top of a hosted identity provider.
//!
//! ## Session Store
//!
//! The identity provider is the source of truth. Every state-change
//! notification it emits is mirrored into a local, synchronous key-value cache
//! under the `user` key, so `is_logged_in` can be answered before the
//! provider's asynchronous state resolves. The mirror is best-effort and may be
//! stale; malformed cache content always reads as logged out.
//!
//! ## Navigation Policy
//!
//! The guard admits a protected destination iff the Session Store reports a
//! signed-in user at evaluation time. Nothing is cached across navigations and
//! a denied navigation is silent.
//!
//! ## Authentication Flows
//!
//! Login, registration, password reset, social login and logout delegate to
//! the provider, upsert the profile record (merge semantics) before navigating,
//! and surface provider errors to the user without retrying.

pub mod auth;
pub mod cli;
pub mod errors;
pub mod navigation;
pub mod provider;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
