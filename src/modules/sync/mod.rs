// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::context::Runtime;
use crate::modules::envelope::Message;
use crate::modules::error::{code::ErrorCode, MailSyncResult};
use crate::modules::fetch::{fetch_mailbox, FetchScope};
use crate::modules::message::mv::store_flags;
use crate::raise_error;
use futures::TryStreamExt;
use itertools::Itertools;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info};

#[cfg(test)]
mod tests;

/// Reconcile deletions from the Maildir back to the servers: take a full
/// INBOX snapshot per server, diff it against local presence, and expunge
/// whatever the user removed locally. Fetching runs first so that a
/// freshly arrived message is never mistaken for a local deletion.
pub async fn sync_all(runtime: &Arc<Runtime>, dry_run: bool) -> MailSyncResult<()> {
    let mut join_set = JoinSet::new();
    for server in runtime.sessions.server_names() {
        let runtime = runtime.clone();
        join_set.spawn(async move {
            info!("### read new messages on {}", server);
            fetch_mailbox(&runtime, &server, "INBOX", FetchScope::New).await?;
            info!("### read all messages on {}", server);
            fetch_mailbox(&runtime, &server, "INBOX", FetchScope::All).await
        });
    }
    let mut snapshot = Vec::new();
    while let Some(result) = join_set.join_next().await {
        let messages =
            result.map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))??;
        snapshot.extend(messages);
    }

    info!("### read local maildir");
    let mut present: HashMap<String, PathBuf> = HashMap::new();
    if runtime.config.common_inbox {
        present = runtime.maildir.scan("", "INBOX").await?;
    } else {
        for server in runtime.sessions.server_names() {
            present.extend(runtime.maildir.scan(&server, "INBOX").await?);
        }
    }

    let indexed: HashSet<String> = runtime
        .index
        .list_all()
        .await?
        .into_iter()
        .map(|record| record.fingerprint)
        .collect();

    let candidates = delete_candidates(&snapshot, &indexed, &present);
    if candidates.is_empty() {
        info!("local maildir and servers agree, nothing to expunge");
        return Ok(());
    }
    if dry_run {
        for message in &candidates {
            info!("dry-run expunge {}", message);
        }
        return Ok(());
    }
    expunge_candidates(runtime, candidates).await
}

/// A message is scheduled for server-side deletion when it is present in
/// the server snapshot and in the index but its fingerprint no longer has
/// a Maildir file: the user deleted it locally.
pub(crate) fn delete_candidates(
    snapshot: &[Message],
    indexed: &HashSet<String>,
    present: &HashMap<String, PathBuf>,
) -> Vec<Message> {
    snapshot
        .iter()
        .filter(|message| {
            indexed.contains(&message.fingerprint) && !present.contains_key(&message.fingerprint)
        })
        .cloned()
        .collect()
}

/// Flag the candidates Deleted on their origin servers, expunge, and only
/// then drop the index rows, so an IMAP failure leaves the index intact
/// for the next run.
async fn expunge_candidates(
    runtime: &Arc<Runtime>,
    candidates: Vec<Message>,
) -> MailSyncResult<()> {
    let mut by_origin: HashMap<String, Vec<Message>> = HashMap::new();
    for message in candidates {
        by_origin.entry(message.origin.clone()).or_default().push(message);
    }

    for (server, messages) in by_origin.into_iter().sorted_by(|a, b| a.0.cmp(&b.0)) {
        let inbox = runtime.sessions.canonical_folder(&server, "inbox")?;
        let handle = runtime.sessions.session(&server)?;
        let mut session = handle.lock().await;
        session
            .select(&inbox)
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;

        let sequence_set = messages
            .iter()
            .map(|message| message.seq_number)
            .sorted()
            .dedup()
            .join(",");
        debug!("{}, remove seqset: {}", server, sequence_set);

        store_flags(&mut session, &sequence_set, "+FLAGS (\\Deleted)").await?;
        let expunged: Vec<u32> = session
            .expunge()
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?
            .try_collect()
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
        info!(
            "expunged {} message(s) on '{}'",
            expunged.len(),
            server
        );
        drop(session);

        for message in &messages {
            runtime.index.delete(&message.fingerprint).await?;
        }
    }
    Ok(())
}
