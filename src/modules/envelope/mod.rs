// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use async_imap::types::{Fetch, Flag};
use md5::{Digest, Md5};
use std::fmt;

/// 32-lowercase-hex MD5 of the raw Message-ID bytes. Used as the index
/// primary key and as the second token of Maildir file names; chosen for
/// compactness, not security. Total and pure; the empty input hashes too,
/// but such messages are never written or indexed.
pub fn fingerprint(message_id: &str) -> String {
    format!("{:x}", Md5::digest(message_id.as_bytes()))
}

/// Message flags as this engine models them: the Maildir-relevant subset
/// plus a passthrough for everything else the server reports.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MessageFlag {
    Seen,
    Answered,
    Junk,
    Deleted,
    Recent,
    Other(String),
}

impl<'a> From<Flag<'a>> for MessageFlag {
    fn from(value: Flag<'a>) -> Self {
        match value {
            Flag::Seen => MessageFlag::Seen,
            Flag::Answered => MessageFlag::Answered,
            Flag::Deleted => MessageFlag::Deleted,
            Flag::Recent => MessageFlag::Recent,
            Flag::Custom(name) => {
                let trimmed = name.trim_start_matches(['\\', '$']);
                if trimmed.eq_ignore_ascii_case("junk") {
                    MessageFlag::Junk
                } else {
                    MessageFlag::Other(name.into_owned())
                }
            }
            other => MessageFlag::Other(format!("{:?}", other)),
        }
    }
}

/// One message as observed on a server or on disk. `seq_number` is only
/// meaningful within the mailbox selection it was read from and is never
/// persisted.
#[derive(Clone, Debug, Default)]
pub struct Message {
    pub message_id: String,
    pub fingerprint: String,
    pub flags: Vec<MessageFlag>,
    pub origin: String,
    pub subject: String,
    pub seq_number: u32,
    pub path: String,
}

impl Message {
    pub fn is_recent(&self) -> bool {
        self.flags.contains(&MessageFlag::Recent)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<origin:{} seq:{} fingerprint:{} mid:{} subject:{:?}>",
            self.origin, self.seq_number, self.fingerprint, self.message_id, self.subject
        )
    }
}

/// Build a Message from a fetched envelope. Returns None when the envelope
/// is missing or carries an empty Message-ID; such entries are skipped by
/// every caller.
pub fn extract_message(fetch: &Fetch, origin: &str) -> Option<Message> {
    let envelope = fetch.envelope()?;
    let message_id = envelope
        .message_id
        .as_ref()
        .map(|raw| String::from_utf8_lossy(raw).trim().to_string())
        .unwrap_or_default();
    if message_id.is_empty() {
        return None;
    }
    let subject = envelope
        .subject
        .as_ref()
        .map(|raw| String::from_utf8_lossy(raw).into_owned())
        .unwrap_or_default();
    let flags: Vec<MessageFlag> = fetch.flags().map(Into::into).collect();
    let digest = fingerprint(&message_id);
    Some(Message {
        fingerprint: digest,
        message_id,
        flags,
        origin: origin.to_string(),
        subject,
        seq_number: fetch.message,
        path: String::new(),
    })
}

/// Compare two Message-ID values, tolerating presence or absence of the
/// surrounding angle brackets.
pub fn message_id_matches(left: &str, right: &str) -> bool {
    fn bare(value: &str) -> &str {
        value
            .trim()
            .trim_start_matches('<')
            .trim_end_matches('>')
            .trim()
    }
    !left.trim().is_empty() && bare(left) == bare(right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_lowercase_hex() {
        let first = fingerprint("<abc@x>");
        let second = fingerprint("<abc@x>");
        assert_eq!(first, second);
        assert_eq!(first.len(), 32);
        assert!(first
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        // known digest of the literal "<abc@x>"
        assert_eq!(first, "8729b1870c5fc72e94c63cb48c48bf18");
    }

    #[test]
    fn fingerprint_distinguishes_ids() {
        assert_ne!(fingerprint("<a@x>"), fingerprint("<b@x>"));
        // angle brackets and whitespace are part of the identity
        assert_ne!(fingerprint("<a@x>"), fingerprint("a@x"));
    }

    #[test]
    fn junk_keyword_variants_are_recognized() {
        assert_eq!(
            MessageFlag::from(Flag::Custom("Junk".into())),
            MessageFlag::Junk
        );
        assert_eq!(
            MessageFlag::from(Flag::Custom("$Junk".into())),
            MessageFlag::Junk
        );
        assert_eq!(
            MessageFlag::from(Flag::Custom("\\Junk".into())),
            MessageFlag::Junk
        );
        assert_eq!(
            MessageFlag::from(Flag::Custom("Muted".into())),
            MessageFlag::Other("Muted".to_string())
        );
    }

    #[test]
    fn message_id_matching_ignores_brackets() {
        assert!(message_id_matches("<abc@x>", "abc@x"));
        assert!(message_id_matches("abc@x", "<abc@x>"));
        assert!(message_id_matches(" <abc@x> ", "<abc@x>"));
        assert!(!message_id_matches("<abc@x>", "<def@x>"));
        assert!(!message_id_matches("", ""));
    }
}
