// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

pub mod client;
pub mod pool;
pub mod session;
#[cfg(test)]
mod tests;

/// An authenticated IMAP session over a boxed transport stream. The
/// underlying library pipelines commands within one session but does not
/// run them concurrently, so every session is driven by one task at a time.
pub type ImapSession = async_imap::Session<Box<dyn session::SessionStream>>;
