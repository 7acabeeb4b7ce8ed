//! Shared types and models for the Sachet Water Management Platform
//!
//! This crate contains types shared between the engine, the app shell,
//! and other components of the system.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
