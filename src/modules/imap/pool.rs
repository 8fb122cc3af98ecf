// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::{code::ErrorCode, MailSyncResult};
use crate::modules::imap::client::Client;
use crate::modules::imap::ImapSession;
use crate::modules::settings::config::ServerConfig;
use crate::raise_error;
use async_imap::types::Name;
use futures::TryStreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// One long-lived authenticated session per configured server, plus the
/// folder list read from each server at startup. Both maps are read-only
/// after `connect_all`; commands on one session run sequentially behind
/// its mutex.
pub struct SessionPool {
    sessions: HashMap<String, Arc<Mutex<ImapSession>>>,
    folders: HashMap<String, Vec<String>>,
}

impl SessionPool {
    /// Dial and authenticate every configured server concurrently. Any
    /// dial, login or LIST failure is fatal: there is no partial-fleet
    /// mode.
    pub async fn connect_all(servers: &[ServerConfig]) -> MailSyncResult<Self> {
        let mut join_set = JoinSet::new();
        for server in servers.iter().cloned() {
            join_set.spawn(async move {
                let client = Client::connection(&server).await?;
                let mut session = client.login(&server.username, &server.password).await?;
                info!("Logged into {}", server.uri);
                let folders = list_folders(&mut session).await?;
                Ok::<_, crate::modules::error::MailSyncError>((server.name, session, folders))
            });
        }

        let mut sessions = HashMap::new();
        let mut folders = HashMap::new();
        while let Some(result) = join_set.join_next().await {
            let (name, session, server_folders) = result
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))??;
            sessions.insert(name.clone(), Arc::new(Mutex::new(session)));
            folders.insert(name, server_folders);
        }
        Ok(Self { sessions, folders })
    }

    pub fn session(&self, server: &str) -> MailSyncResult<Arc<Mutex<ImapSession>>> {
        self.sessions.get(server).cloned().ok_or_else(|| {
            raise_error!(
                format!("no session for server '{}'", server),
                ErrorCode::InternalError
            )
        })
    }

    /// Configured server names, in stable order.
    pub fn server_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sessions.keys().cloned().collect();
        names.sort();
        names
    }

    /// Map a user-supplied folder name onto the server's exact-case name.
    /// The empty name maps to itself (move uses it for delete-only).
    pub fn canonical_folder(&self, server: &str, folder: &str) -> MailSyncResult<String> {
        if folder.is_empty() {
            return Ok(String::new());
        }
        let known = self.folders.get(server).map(Vec::as_slice).unwrap_or(&[]);
        resolve_folder(known, folder).ok_or_else(|| {
            raise_error!(
                format!(
                    "no folder '{}' found in server '{}' folder list {:?}",
                    folder, server, known
                ),
                ErrorCode::FolderNotFound
            )
        })
    }

    /// Best-effort logout on every session, errors logged and swallowed.
    pub async fn logout_all(&self) {
        for (name, session) in &self.sessions {
            let mut session = session.lock().await;
            if let Err(error) = session.logout().await {
                warn!("logout from '{}' failed: {:#?}", name, error);
            }
        }
    }
}

async fn list_folders(session: &mut ImapSession) -> MailSyncResult<Vec<String>> {
    let stream = session
        .list(Some(""), Some("*"))
        .await
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
    let names: Vec<Name> = stream
        .try_collect()
        .await
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
    Ok(names.iter().map(|name| name.name().to_string()).collect())
}

/// Case-insensitive lookup returning the server's exact-case folder name,
/// with the conventional fallbacks for inbox and spam.
pub(crate) fn resolve_folder(known: &[String], folder: &str) -> Option<String> {
    let wanted = folder.to_lowercase();
    if let Some(exact) = known.iter().find(|name| name.to_lowercase() == wanted) {
        return Some(exact.clone());
    }
    match wanted.as_str() {
        "inbox" => Some("INBOX".to_string()),
        "spam" => Some("Spam".to_string()),
        _ => None,
    }
}
