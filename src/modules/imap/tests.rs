// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::imap::pool::resolve_folder;

fn folders(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn exact_case_is_returned_for_case_insensitive_match() {
    let known = folders(&["INBOX", "Archive", "lists/Rust"]);
    assert_eq!(resolve_folder(&known, "archive"), Some("Archive".into()));
    assert_eq!(resolve_folder(&known, "ARCHIVE"), Some("Archive".into()));
    assert_eq!(
        resolve_folder(&known, "Lists/rust"),
        Some("lists/Rust".into())
    );
}

#[test]
fn inbox_and_spam_always_resolve() {
    let known = folders(&[]);
    assert_eq!(resolve_folder(&known, "inbox"), Some("INBOX".into()));
    assert_eq!(resolve_folder(&known, "INBOX"), Some("INBOX".into()));
    assert_eq!(resolve_folder(&known, "spam"), Some("Spam".into()));
}

#[test]
fn server_list_wins_over_fallbacks() {
    let known = folders(&["Inbox", "SPAM"]);
    assert_eq!(resolve_folder(&known, "inbox"), Some("Inbox".into()));
    assert_eq!(resolve_folder(&known, "spam"), Some("SPAM".into()));
}

#[test]
fn unknown_folders_do_not_resolve() {
    let known = folders(&["INBOX"]);
    assert_eq!(resolve_folder(&known, "Missing"), None);
}
