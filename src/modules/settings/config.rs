// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::{code::ErrorCode, MailSyncResult};
use crate::raise_error;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Credentials and endpoint of one IMAP server. `name` is the stable key
/// used everywhere downstream: session map, folder cache, Maildir layout.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    pub name: String,
    /// `host` or `host:port`; the port defaults to 993 with TLS, 143 without.
    pub uri: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub use_tls: bool,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub servers: Vec<ServerConfig>,
    pub maildir: String,
    /// Merge all servers' INBOXes into a single `<maildir>/INBOX/`.
    #[serde(default)]
    pub common_inbox: bool,
    /// `scheme://path` locating the index store.
    #[serde(default)]
    pub db_uri: String,
    #[serde(default)]
    pub verbose: u8,
    #[serde(default)]
    pub profiler: String,
}

impl Config {
    /// Load and validate the configuration from a file, or from standard
    /// input when `path` is `-`.
    pub fn load(path: &str) -> MailSyncResult<Self> {
        let data = if path == "-" {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .map_err(|e| {
                    raise_error!(
                        format!("unable to read configuration from stdin: {}", e),
                        ErrorCode::ConfigParseError
                    )
                })?;
            content
        } else {
            std::fs::read_to_string(path).map_err(|e| {
                raise_error!(
                    format!("unable to read configuration file {}: {}", path, e),
                    ErrorCode::ConfigParseError
                )
            })?
        };
        let mut config: Config = serde_json::from_str(&data).map_err(|e| {
            raise_error!(
                format!("unable to parse configuration {}: {}", path, e),
                ErrorCode::ConfigParseError
            )
        })?;
        config.finalize()?;
        Ok(config)
    }

    fn finalize(&mut self) -> MailSyncResult<()> {
        if self.maildir.is_empty() {
            return Err(raise_error!(
                "please specify maildir in your configuration".into(),
                ErrorCode::MissingConfiguration
            ));
        }
        if self.servers.is_empty() {
            return Err(raise_error!(
                "please specify at least one IMAP server in your configuration".into(),
                ErrorCode::MissingConfiguration
            ));
        }
        for server in &self.servers {
            if server.name.is_empty() || server.uri.is_empty() {
                return Err(raise_error!(
                    "every configured server needs a name and an uri".into(),
                    ErrorCode::MissingConfiguration
                ));
            }
        }
        if self.db_uri.is_empty() {
            self.db_uri = format!("redb://{}/.rustmailsync.db", self.maildir);
        }
        if self.common_inbox {
            for dir in ["cur", "new", "tmp"] {
                let path = Path::new(&self.maildir).join("INBOX").join(dir);
                std::fs::create_dir_all(&path).map_err(|e| {
                    raise_error!(
                        format!("unable to create {:?}: {}", path, e),
                        ErrorCode::MaildirWriteFailed
                    )
                })?;
            }
        }
        Ok(())
    }

    pub fn announce(&self) {
        if self.common_inbox {
            info!(
                "maildir: {}, use common inbox for all IMAP servers",
                self.maildir
            );
        } else {
            info!("maildir: {}", self.maildir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, content: &str) -> String {
        let path = dir.path().join("config.json");
        std::fs::write(&path, content).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn parses_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let maildir = dir.path().join("mail");
        std::fs::create_dir_all(&maildir).unwrap();
        let content = format!(
            r#"{{
                "servers": [
                    {{"name": "home", "uri": "imap.example.com:993",
                     "username": "user", "password": "secret", "useTls": true}}
                ],
                "maildir": "{}",
                "commonInbox": true,
                "verbose": 1,
                "ignoredField": 42
            }}"#,
            maildir.display()
        );
        let path = write_config(&dir, &content);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.servers.len(), 1);
        assert!(config.servers[0].use_tls);
        assert!(config.common_inbox);
        assert_eq!(config.verbose, 1);
        assert_eq!(
            config.db_uri,
            format!("redb://{}/.rustmailsync.db", maildir.display())
        );
        // common inbox directories are created eagerly
        assert!(maildir.join("INBOX").join("cur").is_dir());
        assert!(maildir.join("INBOX").join("new").is_dir());
        assert!(maildir.join("INBOX").join("tmp").is_dir());
    }

    #[test]
    fn missing_maildir_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"{"servers": [{"name": "a", "uri": "b", "username": "", "password": ""}]}"#,
        );
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn missing_servers_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{"servers": [], "maildir": "/tmp/mail"}"#);
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn db_uri_is_kept_when_given() {
        let dir = tempfile::tempdir().unwrap();
        let content = r#"{
            "servers": [{"name": "a", "uri": "imap.example.com", "username": "u", "password": "p"}],
            "maildir": "/tmp/mail",
            "dbUri": "redb:///tmp/custom.db"
        }"#;
        let path = write_config(&dir, content);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.db_uri, "redb:///tmp/custom.db");
    }
}
