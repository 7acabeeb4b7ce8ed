//! Sale transaction and daily reconciliation models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sales channel a transaction was recorded through
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SaleChannel {
    /// Recurring trip by a named supplier
    Supply,
    /// Ad-hoc walk-in sale at the factory gate
    Factory,
}

impl std::fmt::Display for SaleChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaleChannel::Supply => write!(f, "supply"),
            SaleChannel::Factory => write!(f, "factory"),
        }
    }
}

/// One sale transaction
///
/// Immutable after creation except for the supplier day close, which
/// rewrites the final trip's `bags_returned`, `leakages`, `revenue`
/// and `notes`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaleEntry {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub channel: SaleChannel,
    /// Bags requested at sale time, always positive
    pub bags_taken: u32,
    pub price_per_bag: Decimal,
    /// `bags_taken * price_per_bag` at creation, adjusted only by close
    pub revenue: Decimal,
    /// Damaged/exchanged bags reported during the trip; does not affect
    /// the stock deduction
    pub leakages: u32,
    /// Set only by the supplier close on the final trip of a day
    pub bags_returned: u32,
    /// Required for the supply channel
    pub supplier_name: Option<String>,
    /// 1-based, unique per supplier per calendar day
    pub trip_number: Option<u32>,
    /// Informational only, factory channel
    pub customer_name: Option<String>,
    pub notes: Option<String>,
}

/// Input for recording a sale
#[derive(Debug, Clone, Deserialize)]
pub struct RecordSaleInput {
    pub channel: SaleChannel,
    pub bags_taken: u32,
    pub price_per_bag: Decimal,
    pub leakages: u32,
    pub supplier_name: Option<String>,
    pub customer_name: Option<String>,
    pub notes: Option<String>,
}

/// One supplier's trips for the current day
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SupplierDayGroup {
    pub supplier_name: String,
    /// Ordered by trip number ascending
    pub trips: Vec<SaleEntry>,
    pub total_bags: u32,
    pub total_revenue: Decimal,
    pub total_leakages: u32,
    pub is_closed: bool,
}

/// End-of-day summary for the factory channel
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FactoryDaySummary {
    pub date: NaiveDate,
    pub total_bags: u32,
    pub total_revenue: Decimal,
    pub total_transactions: usize,
}

/// Running sales totals for the current day
///
/// Reset lazily when the first sale of a new calendar day is recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailySalesTotals {
    pub date: NaiveDate,
    pub total_bags: u32,
    pub total_revenue: Decimal,
    pub total_leakages: u32,
    pub total_returns: u32,
}

impl DailySalesTotals {
    /// Zeroed totals for the given day
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_bags: 0,
            total_revenue: Decimal::ZERO,
            total_leakages: 0,
            total_returns: 0,
        }
    }
}
