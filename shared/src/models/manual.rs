//! Manual stock entry audit models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Human-auditable record paired 1:1 with a manual stock addition
///
/// Created by the manual stock entry screen alongside (never instead of)
/// the ledger addition; carries no balance of its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManualBagEntry {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub quantity: u32,
    /// Supplier name or free-form description of where the bags came from
    pub source: String,
    pub notes: Option<String>,
    pub entered_by: Option<String>,
}
