// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// One indexed message: the durable link between a Maildir file and the
/// server copy it was fetched from.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct MessageRecord {
    /// MD5 of the Message-ID, 32 lowercase hex characters.
    #[primary_key]
    pub fingerprint: String,
    #[secondary_key(unique)]
    pub message_id: String,
    /// Unix seconds at insert time.
    pub timestamp: i64,
    /// Absolute path of the Maildir file.
    pub path: String,
    /// Symbolic name of the IMAP server the message was observed on.
    pub origin: String,
}
