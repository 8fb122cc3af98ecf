// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::settings::config::Config;
use clap::{Parser, ValueEnum};
use std::{env, fmt, path::PathBuf};

const EXAMPLES: &str = "Examples:
  # fetch new messages from given IMAP folder
  rustmailsync --config config.json --op fetch-new --folder MyFolder
  # fetch all messages from given IMAP folder
  rustmailsync --config config.json --op fetch-all --folder MyFolder
  # sync mails between local maildir and IMAP server(s)
  rustmailsync --config config.json --op sync
  # the same operation with encrypted (gpg) config read from stdin
  gpg -d -o - $HOME/.rustmailsync.gpg | rustmailsync --op sync --config -
  # move given mail id on IMAP server to given folder
  rustmailsync --config config.json --op move --mid '<id@host>' --folder Spam";

#[derive(Debug, Parser)]
#[clap(
    name = "rustmailsync",
    about = "Bi-directional synchronization between IMAP servers and a local Maildir",
    version = env!("CARGO_PKG_VERSION"),
    after_help = EXAMPLES
)]
pub struct Settings {
    /// Path to the JSON configuration file; '-' reads it from standard input
    #[clap(long, env = "RUSTMAILSYNC_CONFIG")]
    pub config: Option<String>,

    /// Operation to perform
    #[clap(long, value_enum, default_value = "sync")]
    pub op: Operation,

    /// IMAP folder used by the fetch and move operations
    #[clap(long, default_value = "INBOX")]
    pub folder: String,

    /// Message-ID literal, or path to a local message file whose Message-ID header is used
    #[clap(long, default_value = "")]
    pub mid: String,

    /// For sync: log the delete plan without mutating servers or the index
    #[clap(long)]
    pub dry_run: bool,

    /// Verbosity level: 0 warnings, 1 info, 2 debug
    #[clap(long, default_value = "0")]
    pub verbose: u8,

    /// If set, append per-operation timing records to the given file
    #[clap(long)]
    pub profiler: Option<PathBuf>,
}

impl Settings {
    /// Resolve the configuration path, defaulting to `$HOME/.rustmailsyncrc`.
    pub fn config_path(&self) -> String {
        self.config.clone().unwrap_or_else(|| {
            let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
            format!("{}/.rustmailsyncrc", home)
        })
    }

    /// The CLI flag wins over the configuration value.
    pub fn profiler_path(&self, config: &Config) -> Option<PathBuf> {
        self.profiler.clone().or_else(|| {
            if config.profiler.is_empty() {
                None
            } else {
                Some(PathBuf::from(&config.profiler))
            }
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Operation {
    #[clap(name = "sync")]
    Sync,
    #[clap(name = "fetch-new")]
    FetchNew,
    #[clap(name = "fetch-all")]
    FetchAll,
    #[clap(name = "move")]
    Move,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Sync => "sync",
            Operation::FetchNew => "fetch-new",
            Operation::FetchAll => "fetch-all",
            Operation::Move => "move",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
