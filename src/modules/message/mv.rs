// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::context::Runtime;
use crate::modules::envelope::{extract_message, message_id_matches, Message};
use crate::modules::error::{code::ErrorCode, MailSyncResult};
use crate::modules::imap::ImapSession;
use crate::modules::message::message_id_from_file;
use crate::raise_error;
use futures::TryStreamExt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

const SCAN_QUERY: &str = "(UID FLAGS ENVELOPE)";

/// Relocate one message on a server into `dest_folder`, or delete it when
/// `dest_folder` is empty. `matcher` is a Message-ID literal, or a path to
/// a local message file whose Message-ID header is used. Unlike fetch,
/// every IMAP error here is fatal: a half-applied move must abort rather
/// than leave the server in an indeterminate state.
pub async fn move_message(
    runtime: &Arc<Runtime>,
    server: &str,
    matcher: &str,
    dest_folder: &str,
) -> MailSyncResult<()> {
    let matcher = if Path::new(matcher).exists() {
        message_id_from_file(Path::new(matcher))?
    } else {
        matcher.to_string()
    };
    if matcher.is_empty() {
        return Err(raise_error!(
            "move operation requires a message id".into(),
            ErrorCode::InvalidParameter
        ));
    }

    let inbox = runtime.sessions.canonical_folder(server, "inbox")?;
    let dest = runtime.sessions.canonical_folder(server, dest_folder)?;

    let handle = runtime.sessions.session(server)?;
    let mut session = handle.lock().await;

    let mailbox = session
        .select(&inbox)
        .await
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
    if mailbox.exists == 0 {
        warn!("no message matching '{}' found on '{}'", matcher, server);
        return Ok(());
    }

    debug!(
        "Fetch from IMAP {} {} 1:{}",
        server, inbox, mailbox.exists
    );
    let mut target: Option<Message> = None;
    {
        let mut stream = session
            .fetch(format!("1:{}", mailbox.exists), SCAN_QUERY)
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
        // Drain the whole response; stopping early would desync the session.
        while let Some(fetch) = stream
            .try_next()
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?
        {
            if target.is_some() {
                continue;
            }
            if let Some(message) = extract_message(&fetch, server) {
                if message_id_matches(&message.message_id, &matcher) {
                    debug!(
                        "Found match: seq:{} mid:{}",
                        message.seq_number, message.message_id
                    );
                    target = Some(message);
                }
            }
        }
    }

    let Some(message) = target else {
        warn!("no message matching '{}' found on '{}'", matcher, server);
        return Ok(());
    };
    transfer(&mut session, server, &inbox, &message, &dest).await
}

/// The wire protocol of a move: mark Seen and COPY when a destination is
/// given, then mark Deleted and EXPUNGE the inbox copy.
async fn transfer(
    session: &mut ImapSession,
    server: &str,
    inbox: &str,
    message: &Message,
    dest: &str,
) -> MailSyncResult<()> {
    session
        .select(inbox)
        .await
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;

    let sequence = message.seq_number.to_string();
    if dest.is_empty() {
        info!("delete {} on {}", message, server);
    } else {
        info!("move {} to '{}' on {}", message.message_id, dest, server);
        store_flags(session, &sequence, "+FLAGS (\\Seen)").await?;
        session
            .copy(&sequence, dest)
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
    }
    store_flags(session, &sequence, "+FLAGS (\\Deleted)").await?;
    let _expunged: Vec<u32> = session
        .expunge()
        .await
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?
        .try_collect()
        .await
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
    Ok(())
}

pub(crate) async fn store_flags(
    session: &mut ImapSession,
    sequence_set: &str,
    query: &str,
) -> MailSyncResult<()> {
    let _updates: Vec<_> = session
        .store(sequence_set, query)
        .await
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?
        .try_collect()
        .await
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
    Ok(())
}
