// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::envelope::{fingerprint, Message};
use crate::modules::sync::delete_candidates;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

fn message(mid: &str, origin: &str, seq: u32) -> Message {
    Message {
        fingerprint: fingerprint(mid),
        message_id: mid.to_string(),
        origin: origin.to_string(),
        seq_number: seq,
        ..Default::default()
    }
}

fn present(mids: &[&str]) -> HashMap<String, PathBuf> {
    mids.iter()
        .map(|mid| (fingerprint(mid), PathBuf::from(format!("/mail/{}", mid))))
        .collect()
}

fn indexed(mids: &[&str]) -> HashSet<String> {
    mids.iter().map(|mid| fingerprint(mid)).collect()
}

#[test]
fn locally_deleted_messages_are_scheduled() {
    let snapshot = vec![message("<keep@x>", "home", 1), message("<gone@x>", "home", 2)];
    // both were fetched at some point, only one file remains
    let candidates = delete_candidates(
        &snapshot,
        &indexed(&["<keep@x>", "<gone@x>"]),
        &present(&["<keep@x>"]),
    );
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].message_id, "<gone@x>");
    assert_eq!(candidates[0].seq_number, 2);
}

#[test]
fn unindexed_messages_are_never_scheduled() {
    // present on the server but never fetched by this tool: not ours to delete
    let snapshot = vec![message("<foreign@x>", "home", 1)];
    let candidates = delete_candidates(&snapshot, &indexed(&[]), &present(&[]));
    assert!(candidates.is_empty());
}

#[test]
fn messages_still_on_disk_are_kept() {
    let snapshot = vec![message("<keep@x>", "home", 1)];
    let candidates = delete_candidates(
        &snapshot,
        &indexed(&["<keep@x>"]),
        &present(&["<keep@x>"]),
    );
    assert!(candidates.is_empty());
}

#[test]
fn candidates_keep_their_origin() {
    // the same diff is computed per server; each candidate carries the
    // origin its expunge must run against
    let snapshot = vec![message("<a@x>", "home", 3), message("<b@x>", "work", 7)];
    let candidates = delete_candidates(
        &snapshot,
        &indexed(&["<a@x>", "<b@x>"]),
        &present(&[]),
    );
    assert_eq!(candidates.len(), 2);
    let origins: Vec<&str> = candidates.iter().map(|m| m.origin.as_str()).collect();
    assert!(origins.contains(&"home"));
    assert!(origins.contains(&"work"));
}
