//! Bag stock ledger models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source tag for additions coming out of a production batch
pub const SOURCE_PRODUCTION: &str = "production";
/// Source tag for unsold bags returned by a supplier at day close
pub const SOURCE_SUPPLIER_REMAINING: &str = "supplier_remaining";
/// Removal reason for a supplier trip sale
pub const REASON_SUPPLIER_SALE: &str = "supplier_sale";
/// Removal reason for a walk-in factory sale
pub const REASON_FACTORY_SALE: &str = "factory_sale";

/// One append-only entry in the bag stock ledger
///
/// Entries are created only by the ledger's own add/remove operations and
/// are never mutated or deleted once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockMovement {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    /// Count of bags moved, always positive
    pub quantity: u32,
    pub kind: MovementKind,
    /// Total stock balance immediately after this movement is applied
    pub running_balance: u32,
}

/// Direction of a stock movement, tagged with why it happened
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MovementKind {
    /// Stock entering the warehouse; `source` is `production`,
    /// `supplier_remaining`, or a free-form manual/external tag
    Addition { source: String },
    /// Stock leaving the warehouse; `reason` is e.g. `supplier_sale`
    /// or `factory_sale`
    Removal { reason: String },
}

impl MovementKind {
    /// The source or reason tag carried by this movement
    pub fn tag(&self) -> &str {
        match self {
            MovementKind::Addition { source } => source,
            MovementKind::Removal { reason } => reason,
        }
    }

    pub fn is_addition(&self) -> bool {
        matches!(self, MovementKind::Addition { .. })
    }
}

/// Today's stock additions bucketed by source
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceBreakdown {
    pub production: u32,
    pub supplier_remaining: u32,
    /// Everything that is neither production output nor a supplier return
    pub manual: u32,
}

/// Dashboard view of the ledger for the current day
///
/// `total` is the all-time current balance, not the sum of today's
/// movements; the sales engine needs "available now" semantics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodayBreakdown {
    pub total: u32,
    pub by_source: SourceBreakdown,
}
