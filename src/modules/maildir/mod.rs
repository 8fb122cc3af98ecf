// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::envelope::{Message, MessageFlag};
use crate::modules::error::{code::ErrorCode, MailSyncResult};
use crate::{raise_error, utc_now};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[cfg(test)]
mod tests;

const SUBDIRS: [&str; 3] = ["cur", "new", "tmp"];

/// On-disk Maildir layout:
///
/// ```text
/// <root>/
///   [<folder> | <origin>/<folder>]/
///     cur/  <unix_ts>.<fingerprint>.<hostname>:2,<flags>
///     new/  <unix_ts>.<fingerprint>.<hostname>
///     tmp/  (staging for atomic rename)
/// ```
///
/// Every write lands in `tmp/` first and is renamed into place, so a file
/// either exists complete or not at all.
#[derive(Clone, Debug)]
pub struct MaildirStore {
    root: PathBuf,
    common_inbox: bool,
    hostname: String,
}

impl MaildirStore {
    pub fn new(root: PathBuf, common_inbox: bool, hostname: String) -> Self {
        Self {
            root,
            common_inbox,
            hostname,
        }
    }

    /// Resolve the on-disk directory for `(origin, folder)`. INBOX collapses
    /// into a shared folder when common-inbox mode is on; slashes inside the
    /// folder name are translated to dots.
    pub fn folder_dir(&self, origin: &str, folder: &str) -> PathBuf {
        let folder = folder.replace('/', ".");
        if origin.is_empty() || (self.common_inbox && folder.eq_ignore_ascii_case("inbox")) {
            self.root.join(folder)
        } else {
            self.root.join(origin).join(folder)
        }
    }

    fn ensure(&self, origin: &str, folder: &str) -> MailSyncResult<PathBuf> {
        let dir = self.folder_dir(origin, folder);
        for sub in SUBDIRS {
            std::fs::create_dir_all(dir.join(sub)).map_err(|e| {
                raise_error!(
                    format!("unable to create {:?}: {}", dir.join(sub), e),
                    ErrorCode::MaildirWriteFailed
                )
            })?;
        }
        Ok(dir)
    }

    /// Enumerate the folder and return `fingerprint -> absolute path`. The
    /// fingerprint is the second dot-separated token of the file name; files
    /// that do not follow the naming convention are ignored. `tmp/` is
    /// scanned as well so that stranded deliveries still register.
    pub async fn scan(
        &self,
        origin: &str,
        folder: &str,
    ) -> MailSyncResult<HashMap<String, PathBuf>> {
        let store = self.clone();
        let origin = origin.to_string();
        let folder = folder.to_string();
        tokio::task::spawn_blocking(move || store.scan_sync(&origin, &folder))
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?
    }

    pub(crate) fn scan_sync(
        &self,
        origin: &str,
        folder: &str,
    ) -> MailSyncResult<HashMap<String, PathBuf>> {
        let dir = self.ensure(origin, folder)?;
        debug!("read local mails from {:?}", dir);
        let mut mails = HashMap::new();
        for sub in SUBDIRS {
            let entries = match std::fs::read_dir(dir.join(sub)) {
                Ok(entries) => entries,
                Err(error) => {
                    debug!("error reading {:?}: {}", dir.join(sub), error);
                    continue;
                }
            };
            for entry in entries.flatten() {
                let name = entry.file_name();
                if let Some(fp) = parse_fingerprint(&name.to_string_lossy()) {
                    mails.insert(fp.to_string(), entry.path());
                }
            }
        }
        Ok(mails)
    }

    /// Persist a fetched message. Returns the path of the newly created
    /// file, or `None` when a file at the target path already exists
    /// (repeated fetches must not duplicate).
    pub async fn write(
        &self,
        origin: String,
        folder: String,
        message: Message,
        body: Vec<u8>,
    ) -> MailSyncResult<Option<PathBuf>> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.write_sync(&origin, &folder, &message, &body))
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?
    }

    pub(crate) fn write_sync(
        &self,
        origin: &str,
        folder: &str,
        message: &Message,
        body: &[u8],
    ) -> MailSyncResult<Option<PathBuf>> {
        let dir = self.ensure(origin, folder)?;
        let tstamp = utc_now!();
        let (file_name, target) = if message.is_recent() {
            let name = format!("{}.{}.{}", tstamp, message.fingerprint, self.hostname);
            let target = dir.join("new").join(&name);
            (name, target)
        } else {
            let name = format!(
                "{}.{}.{}:2,{}",
                tstamp,
                message.fingerprint,
                self.hostname,
                flag_letters(&message.flags)
            );
            let target = dir.join("cur").join(&name);
            (name, target)
        };
        if target.exists() {
            debug!("file {:?} already exists", target);
            return Ok(None);
        }
        let staging = dir.join("tmp").join(&file_name);
        std::fs::write(&staging, normalize_message(body)).map_err(|e| {
            raise_error!(
                format!("unable to write {:?}: {}", staging, e),
                ErrorCode::MaildirWriteFailed
            )
        })?;
        std::fs::rename(&staging, &target).map_err(|e| {
            let _ = std::fs::remove_file(&staging);
            raise_error!(
                format!("unable to rename {:?} to {:?}: {}", staging, target, e),
                ErrorCode::MaildirWriteFailed
            )
        })?;
        Ok(Some(target))
    }
}

/// Translate flags into the Maildir letter string: Seen, Answered and Junk
/// map to `S`, `A`, `J` in input order; Recent routes the file to `new/`
/// instead of contributing a letter; everything else is dropped. An empty
/// translation defaults to `S`.
pub fn flag_letters(flags: &[MessageFlag]) -> String {
    let mut letters = String::new();
    for flag in flags {
        match flag {
            MessageFlag::Seen => letters.push('S'),
            MessageFlag::Answered => letters.push('A'),
            MessageFlag::Junk => letters.push('J'),
            _ => {}
        }
    }
    if letters.is_empty() {
        letters.push('S');
    }
    letters
}

/// Second dot-separated token of a Maildir file name, i.e. the fingerprint
/// in `<unix_ts>.<fingerprint>.<hostname>[:2,<flags>]`.
pub fn parse_fingerprint(file_name: &str) -> Option<&str> {
    let mut tokens = file_name.split('.');
    tokens.next()?;
    tokens.next().filter(|token| !token.is_empty())
}

/// Rewrite a raw RFC-822 message so that each header occupies one line
/// (folded continuation lines joined by a single space), followed by a
/// blank line and the body verbatim.
pub(crate) fn normalize_message(raw: &[u8]) -> Vec<u8> {
    let (headers, body) = split_message(raw);
    let mut out = Vec::with_capacity(raw.len() + 2);
    let mut current: Option<Vec<u8>> = None;
    for line in headers.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            continue;
        }
        if line[0] == b' ' || line[0] == b'\t' {
            // folded continuation, join with a single space
            if let Some(header) = current.as_mut() {
                header.push(b' ');
                header.extend_from_slice(trim_ascii(line));
                continue;
            }
        }
        if let Some(header) = current.take() {
            out.extend_from_slice(&header);
            out.push(b'\n');
        }
        current = Some(line.to_vec());
    }
    if let Some(header) = current.take() {
        out.extend_from_slice(&header);
        out.push(b'\n');
    }
    out.push(b'\n');
    out.extend_from_slice(body);
    out
}

fn split_message(raw: &[u8]) -> (&[u8], &[u8]) {
    if let Some(pos) = find_subslice(raw, b"\r\n\r\n") {
        (&raw[..pos], &raw[pos + 4..])
    } else if let Some(pos) = find_subslice(raw, b"\n\n") {
        (&raw[..pos], &raw[pos + 2..])
    } else {
        (raw, &[][..])
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn trim_ascii(line: &[u8]) -> &[u8] {
    let start = line.iter().position(|b| !b.is_ascii_whitespace());
    let end = line.iter().rposition(|b| !b.is_ascii_whitespace());
    match (start, end) {
        (Some(start), Some(end)) => &line[start..=end],
        _ => &[][..],
    }
}
