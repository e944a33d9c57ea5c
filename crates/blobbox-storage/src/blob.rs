//! Capacity-bounded JSON blob storage

use std::sync::Arc;

use blobbox_core::{QuotaPolicy, encode_value, validate_name};
use serde::Serialize;
use serde_json::Value;
use sqlx::SqliteExecutor;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::models::{DocumentInfo, StoreLimits, StoreStats};
use crate::{Result, Storage};

const USED_BYTES_SQL: &str = "SELECT COALESCE(SUM(LENGTH(CAST(json_text AS BLOB))), 0) FROM json_data";

/// Result of [`BlobStore::save`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// The write would have pushed the total past the capacity; nothing changed
    QuotaExceeded {
        used: u64,
        incoming: u64,
        capacity: u64,
    },
    /// The value could not be serialized; nothing changed
    Unserializable,
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved)
    }
}

/// Named JSON documents in a single table, with a ceiling on their combined
/// serialized size.
///
/// Clones share the same pool and the same write lock, so `save` and `reset`
/// are serialized across every handle of one store.
#[derive(Clone, Debug)]
pub struct BlobStore {
    storage: Storage,
    limits: StoreLimits,
    write_lock: Arc<Mutex<()>>,
}

impl BlobStore {
    pub fn new(storage: Storage, limits: StoreLimits) -> Self {
        Self {
            storage,
            limits,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn limits(&self) -> StoreLimits {
        self.limits
    }

    /// Sum of the UTF-8 byte lengths of every stored document
    pub async fn current_size(&self) -> Result<u64> {
        used_bytes(self.storage.pool()).await
    }

    /// Insert or fully replace the document stored under `name`.
    ///
    /// The size check and the write run in one transaction while holding the
    /// store's write lock.
    pub async fn save<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<SaveOutcome> {
        validate_name(name)?;

        let json_text = match encode_value(value) {
            Ok(text) => text,
            Err(e) => {
                warn!(name, error = %e, "refusing to save unserializable value");
                return Ok(SaveOutcome::Unserializable);
            }
        };
        let incoming = json_text.len() as u64;

        let _guard = self.write_lock.lock().await;
        let mut tx = self.storage.pool().begin().await?;

        let used = used_bytes(&mut *tx).await?;
        let replaced = match self.limits.policy {
            QuotaPolicy::Cumulative => 0,
            QuotaPolicy::Net => stored_bytes(&mut *tx, name).await?.unwrap_or(0),
        };

        let capacity = self.limits.capacity_bytes;
        if !self.limits.policy.admits(capacity, used, replaced, incoming) {
            info!(name, used, incoming, capacity, "save rejected, capacity exceeded");
            return Ok(SaveOutcome::QuotaExceeded {
                used,
                incoming,
                capacity,
            });
        }

        sqlx::query(
            "INSERT INTO json_data (data_name, json_text) VALUES (?1, ?2)
             ON CONFLICT(data_name) DO UPDATE SET json_text = excluded.json_text",
        )
        .bind(name)
        .bind(&json_text)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(name, bytes = incoming, "document saved");

        Ok(SaveOutcome::Saved)
    }

    /// Stored value for `name`. A row whose text no longer parses as JSON is
    /// reported as absent.
    pub async fn load(&self, name: &str) -> Result<Option<Value>> {
        let json_text: Option<String> =
            sqlx::query_scalar("SELECT json_text FROM json_data WHERE data_name = ?1")
                .bind(name)
                .fetch_optional(self.storage.pool())
                .await?;

        let Some(json_text) = json_text else {
            return Ok(None);
        };

        match serde_json::from_str(&json_text) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(name, error = %e, "stored document is not valid JSON");
                Ok(None)
            }
        }
    }

    /// Delete every document. Returns how many were removed.
    pub async fn reset(&self) -> Result<u64> {
        let _guard = self.write_lock.lock().await;

        let removed = sqlx::query("DELETE FROM json_data")
            .execute(self.storage.pool())
            .await?
            .rows_affected();

        info!(removed, "store reset");
        Ok(removed)
    }

    /// Every stored name, sorted
    pub async fn names(&self) -> Result<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar("SELECT data_name FROM json_data ORDER BY data_name")
            .fetch_all(self.storage.pool())
            .await?;
        Ok(names)
    }

    /// Every stored name with its serialized size, sorted by name
    pub async fn entries(&self) -> Result<Vec<DocumentInfo>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT data_name, LENGTH(CAST(json_text AS BLOB)) FROM json_data ORDER BY data_name",
        )
        .fetch_all(self.storage.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, size)| DocumentInfo {
                name,
                size_bytes: size.max(0) as u64,
            })
            .collect())
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        let (documents, used): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(LENGTH(CAST(json_text AS BLOB))), 0) FROM json_data",
        )
        .fetch_one(self.storage.pool())
        .await?;

        Ok(StoreStats {
            documents: documents.max(0) as u64,
            used_bytes: used.max(0) as u64,
            capacity_bytes: self.limits.capacity_bytes,
        })
    }
}

async fn used_bytes<'e, E: SqliteExecutor<'e>>(executor: E) -> Result<u64> {
    let used: i64 = sqlx::query_scalar(USED_BYTES_SQL).fetch_one(executor).await?;
    Ok(used.max(0) as u64)
}

async fn stored_bytes<'e, E: SqliteExecutor<'e>>(executor: E, name: &str) -> Result<Option<u64>> {
    let len: Option<i64> = sqlx::query_scalar(
        "SELECT LENGTH(CAST(json_text AS BLOB)) FROM json_data WHERE data_name = ?1",
    )
    .bind(name)
    .fetch_optional(executor)
    .await?;
    Ok(len.map(|l| l.max(0) as u64))
}
