// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::envelope::{fingerprint, Message, MessageFlag};
use crate::modules::maildir::{flag_letters, normalize_message, parse_fingerprint, MaildirStore};
use std::path::PathBuf;

fn store(common_inbox: bool) -> (tempfile::TempDir, MaildirStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = MaildirStore::new(
        dir.path().to_path_buf(),
        common_inbox,
        "testhost".to_string(),
    );
    (dir, store)
}

fn message(mid: &str, flags: Vec<MessageFlag>) -> Message {
    Message {
        fingerprint: fingerprint(mid),
        message_id: mid.to_string(),
        flags,
        origin: "home".to_string(),
        ..Default::default()
    }
}

#[test]
fn folder_resolution_rules() {
    let (_dir, common) = store(true);
    let root = common.folder_dir("", "INBOX").parent().unwrap().to_path_buf();
    // common inbox collapses every server's INBOX into <root>/INBOX
    assert_eq!(common.folder_dir("home", "INBOX"), root.join("INBOX"));
    assert_eq!(common.folder_dir("home", "inbox"), root.join("inbox"));
    // other folders stay per server
    assert_eq!(
        common.folder_dir("home", "Archive"),
        root.join("home").join("Archive")
    );
    // empty origin always resolves at the root
    assert_eq!(common.folder_dir("", "Archive"), root.join("Archive"));

    let (_dir, separate) = store(false);
    let root: PathBuf = separate
        .folder_dir("", "INBOX")
        .parent()
        .unwrap()
        .to_path_buf();
    assert_eq!(
        separate.folder_dir("home", "INBOX"),
        root.join("home").join("INBOX")
    );
}

#[test]
fn slashes_in_folder_names_become_dots() {
    let (_dir, store) = store(false);
    let dir = store.folder_dir("home", "lists/rust");
    assert!(dir.ends_with(PathBuf::from("home").join("lists.rust")));
}

#[test]
fn flag_letter_translation() {
    assert_eq!(flag_letters(&[MessageFlag::Seen]), "S");
    assert_eq!(
        flag_letters(&[MessageFlag::Seen, MessageFlag::Answered, MessageFlag::Junk]),
        "SAJ"
    );
    // order follows the input flag list
    assert_eq!(
        flag_letters(&[MessageFlag::Junk, MessageFlag::Seen]),
        "JS"
    );
    // Deleted and unknown flags are dropped; empty translation defaults to S
    assert_eq!(
        flag_letters(&[MessageFlag::Deleted, MessageFlag::Other("Muted".into())]),
        "S"
    );
    assert_eq!(flag_letters(&[]), "S");
}

#[test]
fn parse_fingerprint_takes_second_token() {
    assert_eq!(
        parse_fingerprint("1690000000.0cc175b9c0f1b6a831c399e269772661.host:2,S"),
        Some("0cc175b9c0f1b6a831c399e269772661")
    );
    // hostnames with dots do not confuse the parser
    assert_eq!(
        parse_fingerprint("1690000000.abc.mail.example.com:2,SA"),
        Some("abc")
    );
    assert_eq!(parse_fingerprint("1690000000.abc.host"), Some("abc"));
    assert_eq!(parse_fingerprint("no-tokens"), None);
}

#[test]
fn write_routes_seen_to_cur_and_recent_to_new() {
    let (_dir, store) = store(false);
    let body = b"Subject: hi\r\nMessage-ID: <a@x>\r\n\r\nbody\r\n";

    let seen = message("<a@x>", vec![MessageFlag::Seen]);
    let path = store.write_sync("home", "INBOX", &seen, body).unwrap().unwrap();
    assert!(path.parent().unwrap().ends_with("cur"));
    assert!(path.file_name().unwrap().to_string_lossy().ends_with(":2,S"));

    let recent = message("<b@x>", vec![MessageFlag::Seen, MessageFlag::Recent]);
    let path = store
        .write_sync("home", "INBOX", &recent, body)
        .unwrap()
        .unwrap();
    assert!(path.parent().unwrap().ends_with("new"));
    assert!(!path.file_name().unwrap().to_string_lossy().contains(":2,"));

    // tmp/ holds no leftovers after the renames
    let tmp = store.folder_dir("home", "INBOX").join("tmp");
    assert_eq!(std::fs::read_dir(tmp).unwrap().count(), 0);
}

#[test]
fn write_is_idempotent() {
    let (_dir, store) = store(false);
    let body = b"Subject: hi\n\nbody\n";
    let msg = message("<dup@x>", vec![MessageFlag::Seen]);
    let first = store.write_sync("home", "INBOX", &msg, body).unwrap();
    assert!(first.is_some());
    let second = store.write_sync("home", "INBOX", &msg, body).unwrap();
    assert!(second.is_none());
    let cur = store.folder_dir("home", "INBOX").join("cur");
    assert_eq!(std::fs::read_dir(cur).unwrap().count(), 1);
}

#[test]
fn scan_finds_written_messages() {
    let (_dir, store) = store(false);
    let body = b"Subject: hi\n\nbody\n";
    let msg = message("<scan@x>", vec![MessageFlag::Seen]);
    let path = store.write_sync("home", "INBOX", &msg, body).unwrap().unwrap();
    let map = store.scan_sync("home", "INBOX").unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&msg.fingerprint), Some(&path));
}

#[test]
fn scan_sees_both_cur_and_new() {
    let (_dir, store) = store(false);
    let body = b"Subject: hi\n\nbody\n";
    let cur = message("<c@x>", vec![MessageFlag::Seen]);
    let new = message("<n@x>", vec![MessageFlag::Recent]);
    store.write_sync("home", "INBOX", &cur, body).unwrap();
    store.write_sync("home", "INBOX", &new, body).unwrap();
    let map = store.scan_sync("home", "INBOX").unwrap();
    assert!(map.contains_key(&cur.fingerprint));
    assert!(map.contains_key(&new.fingerprint));
}

#[test]
fn normalize_unfolds_headers_and_keeps_body() {
    let raw = b"Subject: a folded\r\n  subject line\r\nFrom: a@x\r\n\r\nline one\r\nline two\r\n";
    let normalized = normalize_message(raw);
    let text = String::from_utf8(normalized).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Subject: a folded subject line"));
    assert_eq!(lines.next(), Some("From: a@x"));
    assert_eq!(lines.next(), Some(""));
    assert_eq!(lines.next(), Some("line one\r"));
    assert_eq!(lines.next(), Some("line two\r"));
}

#[test]
fn normalize_handles_bare_newlines() {
    let raw = b"Subject: hi\nFrom: a@x\n\nbody\n";
    let text = String::from_utf8(normalize_message(raw)).unwrap();
    assert_eq!(text, "Subject: hi\nFrom: a@x\n\nbody\n");
}
