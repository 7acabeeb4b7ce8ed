//! Validation utilities for the Sachet Water Management Platform

use rust_decimal::Decimal;

// ============================================================================
// Stock Validations
// ============================================================================

/// Validate a bag count is positive
pub fn validate_quantity(quantity: u32) -> Result<(), &'static str> {
    if quantity == 0 {
        return Err("Quantity must be greater than zero");
    }
    Ok(())
}

/// Validate a source/reason tag is usable for grouping
pub fn validate_tag(tag: &str) -> Result<(), &'static str> {
    if tag.trim().is_empty() {
        return Err("Tag must not be empty");
    }
    if tag.len() > 40 {
        return Err("Tag must be at most 40 characters");
    }
    Ok(())
}

// ============================================================================
// Sales Validations
// ============================================================================

/// Validate a per-bag price
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price per bag cannot be negative");
    }
    Ok(())
}

/// Validate a supplier name as used for trip grouping and day close
pub fn validate_supplier_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Supplier name is required");
    }
    if name.len() > 80 {
        return Err("Supplier name must be at most 80 characters");
    }
    Ok(())
}
