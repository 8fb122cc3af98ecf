// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::context::Runtime;
use crate::modules::envelope::{extract_message, Message, MessageFlag};
use crate::modules::error::{code::ErrorCode, MailSyncError, MailSyncResult};
use crate::modules::index::MessageRecord;
use crate::raise_error;
use crate::utc_now;
use futures::TryStreamExt;
use itertools::Itertools;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// The fetch query pulls the full body section together with flags and the
/// envelope, so one round trip yields everything the pipeline needs.
const FETCH_QUERY: &str = "(BODY[] FLAGS ENVELOPE)";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FetchScope {
    /// Messages the server does not mark Seen.
    New,
    /// The whole mailbox, `1:exists`.
    All,
}

/// Pull a server folder into the local Maildir and return the list of
/// message descriptors observed in this selection (the snapshot used by
/// sync). Selection and search problems are soft failures for this
/// (server, folder) pair; a failed index insert after a successful file
/// write aborts the run.
pub async fn fetch_mailbox(
    runtime: &Arc<Runtime>,
    server: &str,
    folder: &str,
    scope: FetchScope,
) -> MailSyncResult<Vec<Message>> {
    let folder = match runtime.sessions.canonical_folder(server, folder) {
        Ok(folder) => folder,
        Err(error) => {
            warn!("skipping folder on '{}': {}", server, error);
            return Ok(Vec::new());
        }
    };
    let handle = runtime.sessions.session(server)?;
    let mut session = handle.lock().await;

    let mailbox = match session.select(&folder).await {
        Ok(mailbox) => mailbox,
        Err(error) => {
            warn!(
                "Folder '{}' on '{}', error: {:#?}",
                folder, server, error
            );
            return Ok(Vec::new());
        }
    };

    let sequence_set = match scope {
        FetchScope::New => {
            let ids = session
                .search("UNSEEN")
                .await
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
            if ids.is_empty() {
                info!("No new messages in folder '{}' on '{}'", folder, server);
                return Ok(Vec::new());
            }
            info!(
                "Found {} new message(s) in folder '{}' on '{}'",
                ids.len(),
                folder,
                server
            );
            ids.into_iter().sorted().join(",")
        }
        FetchScope::All => {
            if mailbox.exists == 0 {
                return Ok(Vec::new());
            }
            format!("1:{}", mailbox.exists)
        }
    };

    // Snapshot the folder once; the per-write existence check covers the
    // window where two workers race on the same fingerprint.
    let on_disk = runtime.maildir.scan(server, &folder).await?;

    let mut stream = session
        .fetch(&sequence_set, FETCH_QUERY)
        .await
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;

    let mut observed = Vec::new();
    let mut skipped = 0usize;
    let mut writers: JoinSet<MailSyncResult<()>> = JoinSet::new();
    while let Some(fetch) = stream
        .try_next()
        .await
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?
    {
        let Some(mut message) = extract_message(&fetch, server) else {
            skipped += 1;
            debug!(
                "read mail without usable envelope, seq {} on {}",
                fetch.message, server
            );
            continue;
        };
        debug!("read {} from {}", message, server);

        if let Some(entry) = runtime.index.find(&message.fingerprint).await? {
            debug!("mail with fingerprint {} already exists", entry.fingerprint);
        } else if let Some(path) = on_disk.get(&message.fingerprint) {
            // File landed on disk without an index row (e.g. an earlier run
            // died between write and insert); re-attach it.
            message.path = path.to_string_lossy().into_owned();
            let record = MessageRecord {
                fingerprint: message.fingerprint.clone(),
                message_id: message.message_id.clone(),
                timestamp: utc_now!(),
                path: message.path.clone(),
                origin: message.origin.clone(),
            };
            if let Err(error) = runtime.index.insert(record).await {
                warn!(
                    "unable to re-index existing file for {}: {}",
                    message.fingerprint, error
                );
            }
        } else {
            if scope == FetchScope::New {
                message.flags.push(MessageFlag::Recent);
            }
            match fetch.body() {
                Some(body) => {
                    spawn_write_worker(
                        &mut writers,
                        runtime,
                        server.to_string(),
                        folder.clone(),
                        message.clone(),
                        body.to_vec(),
                    );
                }
                None => {
                    warn!("no body section for {} on {}, skipping", message, server);
                    skipped += 1;
                }
            }
        }
        observed.push(message);
    }
    drop(stream);

    while let Some(result) = writers.join_next().await {
        result.map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))??;
    }
    if skipped > 0 {
        info!(
            "skipped {} unusable message(s) in folder '{}' on '{}'",
            skipped, folder, server
        );
    }
    Ok(observed)
}

/// Persist one message and record it in the index. A filesystem failure
/// only skips this message; an index failure after the file exists is
/// fatal, because an unindexed Maildir file would go undetected forever.
fn spawn_write_worker(
    writers: &mut JoinSet<MailSyncResult<()>>,
    runtime: &Arc<Runtime>,
    server: String,
    folder: String,
    message: Message,
    body: Vec<u8>,
) {
    let maildir = runtime.maildir.clone();
    let index = runtime.index.clone();
    writers.spawn(async move {
        let written = maildir
            .write(server.clone(), folder, message.clone(), body)
            .await;
        match written {
            Err(error) => {
                warn!("unable to write mail {}: {}", message, error);
                Ok(())
            }
            Ok(None) => Ok(()),
            Ok(Some(path)) => {
                let record = MessageRecord {
                    fingerprint: message.fingerprint.clone(),
                    message_id: message.message_id.clone(),
                    timestamp: utc_now!(),
                    path: path.to_string_lossy().into_owned(),
                    origin: server,
                };
                index.insert(record).await.map_err(|error| {
                    raise_error!(
                        format!(
                            "message {} was written to {:?} but not indexed: {}",
                            message.fingerprint, path, error
                        ),
                        ErrorCode::IndexFailure
                    )
                })?;
                Ok::<_, MailSyncError>(())
            }
        }
    });
}
