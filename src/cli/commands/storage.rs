use crate::{auth::USERS_COLLECTION, session::FileCache};
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

pub const ARG_CACHE_PATH: &str = "cache-path";
pub const ARG_COLLECTION: &str = "collection";

#[derive(Debug)]
pub struct Options {
    pub cache_path: PathBuf,
    pub collection: String,
}

impl Options {
    /// Parse local storage arguments from matches.
    ///
    /// # Errors
    /// Returns an error if no cache path is given and the platform has no
    /// user cache directory.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let cache_path = match matches
            .get_one::<String>(ARG_CACHE_PATH)
            .filter(|v| !v.trim().is_empty())
        {
            Some(path) => PathBuf::from(path),
            None => FileCache::default_path().ok_or_else(|| {
                anyhow::anyhow!("no user cache directory available, pass --{ARG_CACHE_PATH}")
            })?,
        };

        let collection = matches
            .get_one::<String>(ARG_COLLECTION)
            .cloned()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| USERS_COLLECTION.to_string());

        Ok(Self {
            cache_path,
            collection,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_CACHE_PATH)
                .long(ARG_CACHE_PATH)
                .help("File holding the local session cache (default: user cache dir)")
                .env("AUTHGATE_CACHE_PATH")
                .global(true),
        )
        .arg(
            Arg::new(ARG_COLLECTION)
                .long(ARG_COLLECTION)
                .help("Document store collection for profile records")
                .env("AUTHGATE_COLLECTION")
                .default_value(USERS_COLLECTION)
                .global(true),
        )
}
