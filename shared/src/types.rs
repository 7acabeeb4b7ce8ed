//! Common types used across the platform

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Date range for queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Inclusive on both ends
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Grade of polyethylene film used for sachet bags
///
/// Heavier-gauge film yields fewer bags per kilogram.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MaterialGrade {
    Premium,
    Standard,
    Economy,
}

impl MaterialGrade {
    /// Expected finished bags per kilogram of film
    pub fn bags_per_kg(&self) -> u32 {
        match self {
            MaterialGrade::Premium => 30,
            MaterialGrade::Standard => 35,
            MaterialGrade::Economy => 40,
        }
    }
}

impl std::fmt::Display for MaterialGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaterialGrade::Premium => write!(f, "Premium"),
            MaterialGrade::Standard => write!(f, "Standard"),
            MaterialGrade::Economy => write!(f, "Economy"),
        }
    }
}

/// Estimate the finished-bag yield for a quantity of film
///
/// Production screens use this to pre-fill expected batch output; the
/// ledger itself only ever sees the actual counted bags.
pub fn estimate_bags(kilograms: Decimal, grade: MaterialGrade) -> u32 {
    (kilograms * Decimal::from(grade.bags_per_kg()))
        .floor()
        .to_u32()
        .unwrap_or(0)
}
