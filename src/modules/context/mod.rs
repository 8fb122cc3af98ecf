// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::MailSyncResult;
use crate::modules::imap::pool::SessionPool;
use crate::modules::index::Index;
use crate::modules::maildir::MaildirStore;
use crate::modules::settings::config::Config;
use crate::modules::utils::tls::install_crypto_provider;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything an operation needs, assembled once at startup and passed
/// explicitly: the parsed configuration, the opened index, the Maildir
/// store and the authenticated session pool. There are no process-wide
/// mutable globals.
pub struct Runtime {
    pub config: Config,
    pub hostname: String,
    pub maildir: MaildirStore,
    pub index: Index,
    pub sessions: SessionPool,
}

impl Runtime {
    pub async fn initialize(config: Config) -> MailSyncResult<Arc<Self>> {
        install_crypto_provider()?;
        let hostname = gethostname::gethostname().to_string_lossy().into_owned();
        let index = Index::open(&config.db_uri)?;
        let sessions = SessionPool::connect_all(&config.servers).await?;
        let maildir = MaildirStore::new(
            PathBuf::from(&config.maildir),
            config.common_inbox,
            hostname.clone(),
        );
        Ok(Arc::new(Self {
            config,
            hostname,
            maildir,
            index,
            sessions,
        }))
    }

    pub async fn shutdown(&self) {
        self.sessions.logout_all().await;
    }
}
