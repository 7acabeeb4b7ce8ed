//! Business logic services for the Sachet Water Management engine

pub mod reporting;
pub mod sales;
pub mod stock;

pub use reporting::ReportingService;
pub use sales::SalesService;
pub use stock::StockService;
