// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

pub mod net;
pub mod timing;
pub mod tls;

#[macro_export]
macro_rules! raise_error {
    ($msg:expr, $code:expr) => {
        $crate::modules::error::MailSyncError::Generic {
            message: $msg,
            location: snafu::Location::default(),
            code: $code,
        }
    };
}

/// Current Unix time in seconds, used for Maildir file names and index rows.
#[macro_export]
macro_rules! utc_now {
    () => {{
        use chrono::Utc;
        Utc::now().timestamp()
    }};
}
