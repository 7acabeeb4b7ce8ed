//! Local state store
//!
//! One JSON document per stable storage key, read fully into memory and
//! rewritten wholesale on every mutation. Collections are persisted
//! newest-first and reloaded verbatim on startup; there is no schema
//! versioning or migration logic. If two devices ever point at the same
//! data directory the last write wins.

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::AppResult;

/// Storage key for the stock movement ledger
pub const KEY_STOCK_MOVEMENTS: &str = "stock_movements";
/// Storage key for manual bag entry audit records
pub const KEY_MANUAL_ENTRIES: &str = "manual_bag_entries";
/// Storage key for the sale transaction history
pub const KEY_SALE_ENTRIES: &str = "sale_entries";
/// Storage key for supplier/factory day-close state
pub const KEY_DAY_CLOSURES: &str = "day_closures";

/// JSON document store over a data directory
#[derive(Debug, Clone)]
pub struct StateStore {
    data_dir: PathBuf,
}

impl StateStore {
    /// Open the store, creating the data directory if needed
    pub async fn open(data_dir: impl Into<PathBuf>) -> AppResult<Self> {
        let data_dir = data_dir.into();
        tokio::fs::create_dir_all(&data_dir).await?;
        Ok(Self { data_dir })
    }

    fn document_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }

    /// Read a document; `None` when it has not been written yet
    pub async fn read<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let path = self.document_path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Rewrite a document wholesale
    pub async fn write<T: Serialize>(&self, key: &str, value: &T) -> AppResult<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(self.document_path(key), bytes).await?;
        Ok(())
    }
}
