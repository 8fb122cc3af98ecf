pub mod context;
pub mod envelope;
pub mod error;
pub mod fetch;
pub mod imap;
pub mod index;
pub mod logger;
pub mod maildir;
pub mod message;
pub mod settings;
pub mod sync;
pub mod utils;
