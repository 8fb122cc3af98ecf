// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::{code::ErrorCode, MailSyncError, MailSyncResult};
use crate::raise_error;
use itertools::Itertools;
use native_db::{Builder, Database, Models};
use std::path::Path;
use std::sync::{Arc, LazyLock};
use tracing::info;

pub mod entity;

pub use entity::MessageRecord;

static INDEX_MODELS: LazyLock<Models> = LazyLock::new(|| {
    let mut models = Models::new();
    models
        .define::<MessageRecord>()
        .expect("failed to define index model");
    models
});

/// Persistent fingerprint-keyed store tying the Maildir namespace to the
/// IMAP namespace. Writers are serialized by the storage engine; reads
/// observe committed state only.
#[derive(Clone)]
pub struct Index {
    db: Arc<Database<'static>>,
}

impl Index {
    /// Open (or create) the store named by a `scheme://path` URI. A fresh
    /// store is detected by the absence of the backing file; creating the
    /// schema is part of opening.
    pub fn open(db_uri: &str) -> MailSyncResult<Self> {
        let (_, path) = db_uri.split_once("://").ok_or_else(|| {
            raise_error!(
                format!("please provide a proper index uri, got '{}'", db_uri),
                ErrorCode::MissingConfiguration
            )
        })?;
        if path.is_empty() {
            return Err(raise_error!(
                format!("index uri '{}' has an empty path", db_uri),
                ErrorCode::MissingConfiguration
            ));
        }
        if !Path::new(path).exists() {
            info!("creating index store {}", path);
        }
        let database = Builder::new()
            .create(&INDEX_MODELS, path)
            .map_err(Self::handle_database_error)?;
        Ok(Self {
            db: Arc::new(database),
        })
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Self {
        let database = Builder::new()
            .create_in_memory(&INDEX_MODELS)
            .expect("failed to create in-memory index");
        Self {
            db: Arc::new(database),
        }
    }

    /// Atomic insert; a unique violation on fingerprint or message_id is an
    /// error and leaves the store untouched.
    pub async fn insert(&self, record: MessageRecord) -> MailSyncResult<()> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let rw = db
                .rw_transaction()
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::IndexFailure))?;
            rw.insert(record)
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::IndexFailure))?;
            rw.commit()
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::IndexFailure))?;
            Ok(())
        })
        .await
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?
    }

    /// Point lookup by fingerprint.
    pub async fn find(&self, fingerprint: &str) -> MailSyncResult<Option<MessageRecord>> {
        let db = self.db.clone();
        let fingerprint = fingerprint.to_string();
        tokio::task::spawn_blocking(move || {
            let r = db
                .r_transaction()
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::IndexFailure))?;
            let record: Option<MessageRecord> = r
                .get()
                .primary(fingerprint)
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::IndexFailure))?;
            Ok(record)
        })
        .await
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?
    }

    /// Idempotent delete: removing a missing fingerprint succeeds.
    pub async fn delete(&self, fingerprint: &str) -> MailSyncResult<()> {
        let db = self.db.clone();
        let fingerprint = fingerprint.to_string();
        tokio::task::spawn_blocking(move || {
            let rw = db
                .rw_transaction()
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::IndexFailure))?;
            let record: Option<MessageRecord> = rw
                .get()
                .primary(fingerprint)
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::IndexFailure))?;
            if let Some(record) = record {
                rw.remove(record)
                    .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::IndexFailure))?;
            }
            rw.commit()
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::IndexFailure))?;
            Ok(())
        })
        .await
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?
    }

    /// Full scan in primary-key order.
    pub async fn list_all(&self) -> MailSyncResult<Vec<MessageRecord>> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let r = db
                .r_transaction()
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::IndexFailure))?;
            let records: Vec<MessageRecord> = r
                .scan()
                .primary()
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::IndexFailure))?
                .all()
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::IndexFailure))?
                .try_collect()
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::IndexFailure))?;
            Ok(records)
        })
        .await
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?
    }

    fn handle_database_error(error: native_db::db_type::Error) -> MailSyncError {
        match error {
            native_db::db_type::Error::RedbDatabaseError(database_error) => match database_error {
                redb::DatabaseError::DatabaseAlreadyOpen => {
                    raise_error!(
                        "index store is already open by another instance".into(),
                        ErrorCode::IndexFailure
                    )
                }
                other => {
                    raise_error!(
                        format!("index store error: {:?}", other),
                        ErrorCode::IndexFailure
                    )
                }
            },
            other => {
                raise_error!(
                    format!("failed to open index store: {:?}", other),
                    ErrorCode::IndexFailure
                )
            }
        }
    }
}
