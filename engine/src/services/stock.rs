//! Bag stock ledger service
//!
//! Append-only record of every finished-goods bag movement, with the
//! current balance derived from the most recent entry's running balance.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, Utc};
use tokio::sync::RwLock;

use shared::models::{
    ManualBagEntry, MovementKind, SourceBreakdown, StockMovement, TodayBreakdown,
    SOURCE_PRODUCTION, SOURCE_SUPPLIER_REMAINING,
};
use shared::validation;

use crate::error::{AppError, AppResult};
use crate::store::{StateStore, KEY_MANUAL_ENTRIES, KEY_STOCK_MOVEMENTS};

/// The local calendar date an instant falls on
///
/// All "today" aggregations key off this; day state is computed on read,
/// never stored.
pub(crate) fn local_day(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&Local).date_naive()
}

/// Stock ledger service owning bag inventory truth
#[derive(Clone)]
pub struct StockService {
    store: StateStore,
    state: Arc<RwLock<StockState>>,
}

#[derive(Debug, Default)]
struct StockState {
    /// Oldest first in memory; persisted newest-first
    movements: Vec<StockMovement>,
    manual_entries: Vec<ManualBagEntry>,
    next_movement_id: u64,
    next_entry_id: u64,
}

impl StockState {
    fn balance(&self) -> u32 {
        self.movements
            .last()
            .map(|m| m.running_balance)
            .unwrap_or(0)
    }
}

impl StockService {
    /// Load the ledger and audit list from the store
    pub async fn load(store: StateStore) -> AppResult<Self> {
        let mut movements: Vec<StockMovement> =
            store.read(KEY_STOCK_MOVEMENTS).await?.unwrap_or_default();
        movements.reverse();

        let mut manual_entries: Vec<ManualBagEntry> =
            store.read(KEY_MANUAL_ENTRIES).await?.unwrap_or_default();
        manual_entries.reverse();

        let next_movement_id = movements.iter().map(|m| m.id).max().map_or(1, |id| id + 1);
        let next_entry_id = manual_entries
            .iter()
            .map(|e| e.id)
            .max()
            .map_or(1, |id| id + 1);

        let state = StockState {
            movements,
            manual_entries,
            next_movement_id,
            next_entry_id,
        };
        tracing::debug!(
            "Stock ledger loaded: {} movements, balance {}",
            state.movements.len(),
            state.balance()
        );

        Ok(Self {
            store,
            state: Arc::new(RwLock::new(state)),
        })
    }

    /// Record bags entering the warehouse
    pub async fn add_stock(&self, quantity: u32, source: &str) -> AppResult<StockMovement> {
        validation::validate_quantity(quantity)
            .map_err(|msg| AppError::invalid_input("quantity", msg))?;
        validation::validate_tag(source).map_err(|msg| AppError::invalid_input("source", msg))?;

        let mut state = self.state.write().await;
        let movement = StockMovement {
            id: state.next_movement_id,
            timestamp: Utc::now(),
            quantity,
            kind: MovementKind::Addition {
                source: source.to_string(),
            },
            running_balance: state.balance() + quantity,
        };

        state.movements.push(movement.clone());
        if let Err(e) = self.persist_movements(&state).await {
            state.movements.pop();
            return Err(e);
        }
        state.next_movement_id += 1;

        tracing::info!(
            "Stock addition: {} bags from '{}', balance {}",
            quantity,
            source,
            movement.running_balance
        );
        Ok(movement)
    }

    /// Record bags leaving the warehouse
    ///
    /// Rejected outright when the requested quantity exceeds the current
    /// balance; a removal is never split or partially applied.
    pub async fn remove_stock(&self, quantity: u32, reason: &str) -> AppResult<StockMovement> {
        validation::validate_quantity(quantity)
            .map_err(|msg| AppError::invalid_input("quantity", msg))?;
        validation::validate_tag(reason).map_err(|msg| AppError::invalid_input("reason", msg))?;

        let mut state = self.state.write().await;
        let available = state.balance();
        if quantity > available {
            return Err(AppError::InsufficientStock {
                available,
                requested: quantity,
            });
        }

        let movement = StockMovement {
            id: state.next_movement_id,
            timestamp: Utc::now(),
            quantity,
            kind: MovementKind::Removal {
                reason: reason.to_string(),
            },
            running_balance: available - quantity,
        };

        state.movements.push(movement.clone());
        if let Err(e) = self.persist_movements(&state).await {
            state.movements.pop();
            return Err(e);
        }
        state.next_movement_id += 1;

        tracing::info!(
            "Stock removal: {} bags for '{}', balance {}",
            quantity,
            reason,
            movement.running_balance
        );
        Ok(movement)
    }

    /// The most recent movement's running balance, or 0 for an empty ledger
    pub async fn current_balance(&self) -> u32 {
        self.state.read().await.balance()
    }

    /// Today's additions bucketed by source, with the all-time balance
    pub async fn today_breakdown(&self) -> TodayBreakdown {
        let state = self.state.read().await;
        Self::today_breakdown_at(&state, local_day(Utc::now()))
    }

    /// Full movement history, newest first
    pub async fn movements(&self) -> Vec<StockMovement> {
        let state = self.state.read().await;
        state.movements.iter().rev().cloned().collect()
    }

    /// Append the audit record paired with a manual stock addition
    ///
    /// The caller records the matching `add_stock` movement itself; the
    /// ledger never creates a movement from an audit entry.
    pub async fn record_manual_entry(
        &self,
        quantity: u32,
        source: &str,
        notes: Option<String>,
        entered_by: Option<String>,
    ) -> AppResult<ManualBagEntry> {
        validation::validate_quantity(quantity)
            .map_err(|msg| AppError::invalid_input("quantity", msg))?;
        validation::validate_tag(source).map_err(|msg| AppError::invalid_input("source", msg))?;

        let mut state = self.state.write().await;
        let entry = ManualBagEntry {
            id: state.next_entry_id,
            timestamp: Utc::now(),
            quantity,
            source: source.to_string(),
            notes,
            entered_by,
        };

        state.manual_entries.push(entry.clone());
        if let Err(e) = self.persist_manual_entries(&state).await {
            state.manual_entries.pop();
            return Err(e);
        }
        state.next_entry_id += 1;

        Ok(entry)
    }

    /// Manual entry audit history, newest first
    pub async fn manual_entries(&self) -> Vec<ManualBagEntry> {
        let state = self.state.read().await;
        state.manual_entries.iter().rev().cloned().collect()
    }

    fn today_breakdown_at(state: &StockState, today: NaiveDate) -> TodayBreakdown {
        let mut by_source = SourceBreakdown::default();
        for movement in &state.movements {
            if local_day(movement.timestamp) != today {
                continue;
            }
            if let MovementKind::Addition { source } = &movement.kind {
                match source.as_str() {
                    SOURCE_PRODUCTION => by_source.production += movement.quantity,
                    SOURCE_SUPPLIER_REMAINING => by_source.supplier_remaining += movement.quantity,
                    _ => by_source.manual += movement.quantity,
                }
            }
        }
        TodayBreakdown {
            total: state.balance(),
            by_source,
        }
    }

    async fn persist_movements(&self, state: &StockState) -> AppResult<()> {
        let newest_first: Vec<&StockMovement> = state.movements.iter().rev().collect();
        self.store.write(KEY_STOCK_MOVEMENTS, &newest_first).await
    }

    async fn persist_manual_entries(&self, state: &StockState) -> AppResult<()> {
        let newest_first: Vec<&ManualBagEntry> = state.manual_entries.iter().rev().collect();
        self.store.write(KEY_MANUAL_ENTRIES, &newest_first).await
    }
}
