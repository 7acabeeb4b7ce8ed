//! Sachet Water Management Platform - Engine
//!
//! Bag stock ledger and sales reconciliation for a sachet-water production
//! business. The engine is a library: the app shell constructs the services
//! once at startup and drives them from its screens; rendering, navigation,
//! authentication and report export live outside this crate.

pub mod config;
pub mod error;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};

use services::{ReportingService, SalesService, StockService};
use store::StateStore;

/// Application state shared across screens
#[derive(Clone)]
pub struct AppState {
    pub stock: StockService,
    pub sales: SalesService,
    pub reporting: ReportingService,
}

impl AppState {
    /// Open the store and construct the services in dependency order
    pub async fn init(config: &Config) -> AppResult<Self> {
        tracing::info!("Starting Sachet Water Management engine");
        tracing::info!("Environment: {}", config.environment);

        let store = StateStore::open(config.storage.data_dir.clone()).await?;
        let stock = StockService::load(store.clone()).await?;
        let sales = SalesService::load(store, stock.clone()).await?;
        let reporting = ReportingService::new(stock.clone(), sales.clone());

        Ok(Self {
            stock,
            sales,
            reporting,
        })
    }
}
