// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::{code::ErrorCode, MailSyncResult};
use crate::raise_error;
use mail_parser::MessageParser;
use std::path::Path;

pub mod mv;

/// Extract the Message-ID header from a local message file, returned in
/// its bracketed wire form so it compares against IMAP envelopes.
pub fn message_id_from_file(path: &Path) -> MailSyncResult<String> {
    let raw = std::fs::read(path).map_err(|e| {
        raise_error!(
            format!("unable to read {:?}: {}", path, e),
            ErrorCode::InvalidParameter
        )
    })?;
    let parsed = MessageParser::default().parse(&raw).ok_or_else(|| {
        raise_error!(
            format!("unable to parse message file {:?}", path),
            ErrorCode::InvalidParameter
        )
    })?;
    let message_id = parsed.message_id().ok_or_else(|| {
        raise_error!(
            format!("no Message-ID header in {:?}", path),
            ErrorCode::InvalidParameter
        )
    })?;
    Ok(format!("<{}>", message_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_is_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mail");
        std::fs::write(
            &path,
            b"From: a@x\r\nMessage-ID: <file@x>\r\nSubject: hi\r\n\r\nbody\r\n",
        )
        .unwrap();
        assert_eq!(message_id_from_file(&path).unwrap(), "<file@x>");
    }

    #[test]
    fn file_without_message_id_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mail");
        std::fs::write(&path, b"From: a@x\r\n\r\nbody\r\n").unwrap();
        assert!(message_id_from_file(&path).is_err());
    }
}
