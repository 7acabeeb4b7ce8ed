//! Sales reconciliation service
//!
//! Records sale transactions across the supply and factory channels,
//! numbers supplier trips per calendar day, and settles each channel at
//! end of day. Stock availability is enforced through the injected
//! [`StockService`]; a sale that cannot deduct stock is never recorded.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use shared::models::{
    DailySalesTotals, DayClosureState, FactoryDaySummary, RecordSaleInput, SaleChannel, SaleEntry,
    SupplierDayClosure, SupplierDayGroup, REASON_FACTORY_SALE, REASON_SUPPLIER_SALE,
    SOURCE_SUPPLIER_REMAINING,
};
use shared::types::DateRange;
use shared::validation;

use crate::error::{AppError, AppResult};
use crate::services::stock::{local_day, StockService};
use crate::store::{StateStore, KEY_DAY_CLOSURES, KEY_SALE_ENTRIES};

/// Sales reconciliation service owning sales truth
#[derive(Clone)]
pub struct SalesService {
    store: StateStore,
    stock: StockService,
    state: Arc<RwLock<SalesState>>,
}

#[derive(Debug)]
struct SalesState {
    /// Oldest first in memory; persisted newest-first
    sales: Vec<SaleEntry>,
    closures: DayClosureState,
    /// Running aggregate for the dashboard, reset lazily at day rollover
    today: DailySalesTotals,
    next_sale_id: u64,
}

impl SalesService {
    /// Load sales history and day-close state from the store
    pub async fn load(store: StateStore, stock: StockService) -> AppResult<Self> {
        let mut sales: Vec<SaleEntry> = store.read(KEY_SALE_ENTRIES).await?.unwrap_or_default();
        sales.reverse();

        let closures: DayClosureState = store.read(KEY_DAY_CLOSURES).await?.unwrap_or_default();

        let next_sale_id = sales.iter().map(|s| s.id).max().map_or(1, |id| id + 1);
        let today = Self::rebuild_today_totals(&sales, local_day(Utc::now()));

        tracing::debug!("Sales history loaded: {} entries", sales.len());

        Ok(Self {
            store,
            stock,
            state: Arc::new(RwLock::new(SalesState {
                sales,
                closures,
                today,
                next_sale_id,
            })),
        })
    }

    /// Record one sale transaction
    ///
    /// Preconditions are checked in a fixed order and the first failure
    /// wins; on any failure neither the ledger nor the sale history is
    /// touched.
    pub async fn record_sale(&self, input: RecordSaleInput) -> AppResult<SaleEntry> {
        self.record_sale_at(input, Utc::now()).await
    }

    async fn record_sale_at(
        &self,
        input: RecordSaleInput,
        now: DateTime<Utc>,
    ) -> AppResult<SaleEntry> {
        validation::validate_quantity(input.bags_taken)
            .map_err(|msg| AppError::invalid_input("bags_taken", msg))?;
        validation::validate_price(input.price_per_bag)
            .map_err(|msg| AppError::invalid_input("price_per_bag", msg))?;

        let today = local_day(now);
        let mut state = self.state.write().await;

        if input.channel == SaleChannel::Factory && state.closures.factory_closed(today) {
            return Err(AppError::ChannelClosed(
                "Factory sales are closed for today".to_string(),
            ));
        }

        let supplier_name = match input.channel {
            SaleChannel::Supply => {
                let name = input.supplier_name.as_deref().unwrap_or("");
                validation::validate_supplier_name(name)
                    .map_err(|msg| AppError::invalid_input("supplier_name", msg))?;
                let name = name.trim().to_string();
                if state.closures.supplier_closed(&name, today) {
                    return Err(AppError::ChannelClosed(format!(
                        "Supplier {} is already closed for today",
                        name
                    )));
                }
                Some(name)
            }
            SaleChannel::Factory => None,
        };

        let available = self.stock.current_balance().await;
        if input.bags_taken > available {
            return Err(AppError::InsufficientStock {
                available,
                requested: input.bags_taken,
            });
        }

        let trip_number = supplier_name
            .as_deref()
            .map(|name| Self::trip_count(&state.sales, name, today) + 1);

        let reason = match input.channel {
            SaleChannel::Supply => REASON_SUPPLIER_SALE,
            SaleChannel::Factory => REASON_FACTORY_SALE,
        };
        // Re-checked inside the ledger; a race with an external caller
        // fails the whole sale before anything is written.
        self.stock.remove_stock(input.bags_taken, reason).await?;

        let entry = SaleEntry {
            id: state.next_sale_id,
            timestamp: now,
            channel: input.channel,
            bags_taken: input.bags_taken,
            price_per_bag: input.price_per_bag,
            revenue: Decimal::from(input.bags_taken) * input.price_per_bag,
            leakages: input.leakages,
            bags_returned: 0,
            supplier_name,
            trip_number,
            customer_name: match input.channel {
                SaleChannel::Factory => input.customer_name,
                SaleChannel::Supply => None,
            },
            notes: input.notes,
        };

        state.sales.push(entry.clone());
        if let Err(e) = self.persist_sales(&state).await {
            state.sales.pop();
            tracing::error!("Sale could not be persisted after stock deduction: {}", e);
            return Err(e);
        }
        state.next_sale_id += 1;

        if state.today.date != today {
            state.today = DailySalesTotals::empty(today);
        }
        state.today.total_bags += entry.bags_taken;
        state.today.total_revenue += entry.revenue;
        state.today.total_leakages += entry.leakages;

        tracing::info!(
            "Sale recorded: {} x {} bags at {}",
            entry.channel,
            entry.bags_taken,
            entry.price_per_bag
        );
        Ok(entry)
    }

    /// Today's supply trips grouped per supplier, in first-trip order
    pub async fn today_supplier_groups(&self) -> Vec<SupplierDayGroup> {
        let state = self.state.read().await;
        Self::supplier_groups(&state, local_day(Utc::now()))
    }

    /// End-of-day settlement for one supplier's accumulated trips
    ///
    /// The remaining/leakage counts reported at close time belong to the
    /// last physical trip of the day, so only the final trip is rewritten;
    /// earlier trips keep their recorded revenue.
    pub async fn close_supplier_day(
        &self,
        supplier_name: &str,
        remaining_bags: u32,
        additional_leakages: u32,
    ) -> AppResult<SaleEntry> {
        self.close_supplier_day_at(supplier_name, remaining_bags, additional_leakages, Utc::now())
            .await
    }

    async fn close_supplier_day_at(
        &self,
        supplier_name: &str,
        remaining_bags: u32,
        additional_leakages: u32,
        now: DateTime<Utc>,
    ) -> AppResult<SaleEntry> {
        validation::validate_supplier_name(supplier_name)
            .map_err(|msg| AppError::invalid_input("supplier_name", msg))?;
        let supplier_name = supplier_name.trim();
        let today = local_day(now);

        let mut state = self.state.write().await;
        if state.closures.supplier_closed(supplier_name, today) {
            return Err(AppError::ChannelClosed(format!(
                "Supplier {} is already closed for today",
                supplier_name
            )));
        }

        // Final trip = highest trip number among today's trips
        let final_idx = state
            .sales
            .iter()
            .enumerate()
            .filter(|(_, s)| {
                s.channel == SaleChannel::Supply
                    && s.supplier_name.as_deref() == Some(supplier_name)
                    && local_day(s.timestamp) == today
            })
            .max_by_key(|(_, s)| s.trip_number)
            .map(|(idx, _)| idx)
            .ok_or_else(|| {
                AppError::NotFound(format!("Supplier {} has no trips today", supplier_name))
            })?;

        let original = state.sales[final_idx].clone();
        let deduction = (Decimal::from(remaining_bags) + Decimal::from(additional_leakages))
            * original.price_per_bag;
        let adjusted_revenue = (original.revenue - deduction).max(Decimal::ZERO);

        let mut updated = original.clone();
        updated.bags_returned = remaining_bags;
        updated.leakages = original.leakages + additional_leakages;
        updated.revenue = adjusted_revenue;
        updated.notes = Some(format!(
            "Day close: {} bags returned, {} additional leakages, {} deducted from trip {} revenue",
            remaining_bags,
            additional_leakages,
            deduction,
            original.trip_number.unwrap_or(0),
        ));

        state.sales[final_idx] = updated.clone();
        state.closures.supplier_closures.push(SupplierDayClosure {
            supplier_name: supplier_name.to_string(),
            date: today,
            remaining_bags,
            additional_leakages,
            closed_at: now,
        });

        if let Err(e) = self.persist_day_state(&state).await {
            state.sales[final_idx] = original;
            state.closures.supplier_closures.pop();
            return Err(e);
        }

        // Physically unsold bags return to available inventory
        if remaining_bags > 0 {
            self.stock
                .add_stock(remaining_bags, SOURCE_SUPPLIER_REMAINING)
                .await?;
        }

        if state.today.date == today {
            state.today.total_leakages += additional_leakages;
            state.today.total_returns += remaining_bags;
            state.today.total_revenue -= original.revenue - adjusted_revenue;
        } else {
            // Stale aggregate; the rewritten final trip already carries the
            // adjustments, so rebuild instead of applying them twice.
            state.today = Self::rebuild_today_totals(&state.sales, today);
        }

        tracing::info!(
            "Supplier {} closed for {}: {} bags returned, {} leakages, trip revenue now {}",
            supplier_name,
            today,
            remaining_bags,
            additional_leakages,
            adjusted_revenue
        );
        Ok(updated)
    }

    /// Close the factory channel for today and report its totals
    ///
    /// Idempotent; the summary is recomputed on every call. The channel
    /// stays closed until the calendar day rolls over.
    pub async fn close_factory_day(&self) -> AppResult<FactoryDaySummary> {
        self.close_factory_day_at(Utc::now()).await
    }

    async fn close_factory_day_at(&self, now: DateTime<Utc>) -> AppResult<FactoryDaySummary> {
        let today = local_day(now);
        let mut state = self.state.write().await;

        if state.closures.factory_closed_on != Some(today) {
            let previous = state.closures.factory_closed_on;
            state.closures.factory_closed_on = Some(today);
            if let Err(e) = self.persist_closures(&state).await {
                state.closures.factory_closed_on = previous;
                return Err(e);
            }
            tracing::info!("Factory channel closed for {}", today);
        }

        Ok(Self::factory_summary(&state, today))
    }

    /// Whether factory sales are closed for the current day
    pub async fn factory_closed_today(&self) -> bool {
        let state = self.state.read().await;
        state.closures.factory_closed(local_day(Utc::now()))
    }

    /// Today's factory-channel totals
    pub async fn factory_summary_today(&self) -> FactoryDaySummary {
        let state = self.state.read().await;
        Self::factory_summary(&state, local_day(Utc::now()))
    }

    /// The running totals for the current day
    pub async fn today_totals(&self) -> DailySalesTotals {
        let state = self.state.read().await;
        let today = local_day(Utc::now());
        if state.today.date == today {
            state.today.clone()
        } else {
            DailySalesTotals::empty(today)
        }
    }

    /// Full sale history, newest first
    pub async fn sales_history(&self) -> Vec<SaleEntry> {
        let state = self.state.read().await;
        state.sales.iter().rev().cloned().collect()
    }

    /// Sales whose local date falls inside the range, newest first
    pub async fn sales_between(&self, range: &DateRange) -> Vec<SaleEntry> {
        let state = self.state.read().await;
        state
            .sales
            .iter()
            .rev()
            .filter(|s| range.contains(local_day(s.timestamp)))
            .cloned()
            .collect()
    }

    fn trip_count(sales: &[SaleEntry], supplier_name: &str, today: NaiveDate) -> u32 {
        sales
            .iter()
            .filter(|s| {
                s.channel == SaleChannel::Supply
                    && s.supplier_name.as_deref() == Some(supplier_name)
                    && local_day(s.timestamp) == today
            })
            .count() as u32
    }

    fn supplier_groups(state: &SalesState, today: NaiveDate) -> Vec<SupplierDayGroup> {
        let mut groups: Vec<SupplierDayGroup> = Vec::new();
        for sale in state.sales.iter().filter(|s| {
            s.channel == SaleChannel::Supply && local_day(s.timestamp) == today
        }) {
            let name = sale.supplier_name.clone().unwrap_or_default();
            let idx = match groups.iter().position(|g| g.supplier_name == name) {
                Some(idx) => idx,
                None => {
                    groups.push(SupplierDayGroup {
                        supplier_name: name.clone(),
                        trips: Vec::new(),
                        total_bags: 0,
                        total_revenue: Decimal::ZERO,
                        total_leakages: 0,
                        is_closed: state.closures.supplier_closed(&name, today),
                    });
                    groups.len() - 1
                }
            };
            let group = &mut groups[idx];
            group.trips.push(sale.clone());
            group.total_bags += sale.bags_taken;
            group.total_revenue += sale.revenue;
            group.total_leakages += sale.leakages;
        }
        for group in &mut groups {
            group.trips.sort_by_key(|t| t.trip_number);
        }
        groups
    }

    fn factory_summary(state: &SalesState, today: NaiveDate) -> FactoryDaySummary {
        let mut summary = FactoryDaySummary {
            date: today,
            total_bags: 0,
            total_revenue: Decimal::ZERO,
            total_transactions: 0,
        };
        for sale in state.sales.iter().filter(|s| {
            s.channel == SaleChannel::Factory && local_day(s.timestamp) == today
        }) {
            summary.total_bags += sale.bags_taken;
            summary.total_revenue += sale.revenue;
            summary.total_transactions += 1;
        }
        summary
    }

    fn rebuild_today_totals(sales: &[SaleEntry], today: NaiveDate) -> DailySalesTotals {
        let mut totals = DailySalesTotals::empty(today);
        for sale in sales.iter().filter(|s| local_day(s.timestamp) == today) {
            totals.total_bags += sale.bags_taken;
            totals.total_revenue += sale.revenue;
            totals.total_leakages += sale.leakages;
            totals.total_returns += sale.bags_returned;
        }
        totals
    }

    async fn persist_sales(&self, state: &SalesState) -> AppResult<()> {
        let newest_first: Vec<&SaleEntry> = state.sales.iter().rev().collect();
        self.store.write(KEY_SALE_ENTRIES, &newest_first).await
    }

    async fn persist_closures(&self, state: &SalesState) -> AppResult<()> {
        self.store.write(KEY_DAY_CLOSURES, &state.closures).await
    }

    async fn persist_day_state(&self, state: &SalesState) -> AppResult<()> {
        self.persist_sales(state).await?;
        self.persist_closures(state).await
    }
}
