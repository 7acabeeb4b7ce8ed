//! Reporting helpers for the dashboard and report screens

use serde::Serialize;

use shared::models::{DailySalesTotals, FactoryDaySummary, SupplierDayGroup, TodayBreakdown};

use crate::services::{SalesService, StockService};

/// Everything the dashboard shows for the current day
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub stock: TodayBreakdown,
    pub sales_today: DailySalesTotals,
    pub supplier_groups: Vec<SupplierDayGroup>,
    pub factory: FactoryDaySummary,
    pub factory_closed: bool,
}

/// Read-only reporting service composed over the two stateful services
#[derive(Clone)]
pub struct ReportingService {
    stock: StockService,
    sales: SalesService,
}

impl ReportingService {
    /// Create a new ReportingService instance
    pub fn new(stock: StockService, sales: SalesService) -> Self {
        Self { stock, sales }
    }

    /// Assemble the dashboard view; pure reads, no side effects
    pub async fn dashboard_summary(&self) -> DashboardSummary {
        DashboardSummary {
            stock: self.stock.today_breakdown().await,
            sales_today: self.sales.today_totals().await,
            supplier_groups: self.sales.today_supplier_groups().await,
            factory: self.sales.factory_summary_today().await,
            factory_closed: self.sales.factory_closed_today().await,
        }
    }
}
