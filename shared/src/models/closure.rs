//! Day-close state models
//!
//! Closed status is explicit, tagged state keyed by (supplier, local date)
//! rather than something inferred from trip data, so a trip that happens to
//! carry returned bags can never mark a day closed on its own.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Marker that one supplier's day has been settled
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupplierDayClosure {
    pub supplier_name: String,
    /// Local calendar date the closure applies to
    pub date: NaiveDate,
    pub remaining_bags: u32,
    pub additional_leakages: u32,
    pub closed_at: DateTime<Utc>,
}

/// Persisted day-close state for both channels
///
/// The factory flag needs no scheduled reset: the channel is closed iff
/// `factory_closed_on` equals the current local date, so it expires at the
/// midnight boundary on its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayClosureState {
    pub factory_closed_on: Option<NaiveDate>,
    pub supplier_closures: Vec<SupplierDayClosure>,
}

impl DayClosureState {
    pub fn factory_closed(&self, today: NaiveDate) -> bool {
        self.factory_closed_on == Some(today)
    }

    pub fn supplier_closed(&self, supplier_name: &str, today: NaiveDate) -> bool {
        self.supplier_closures
            .iter()
            .any(|c| c.date == today && c.supplier_name == supplier_name)
    }
}
