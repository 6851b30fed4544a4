//! # Error Types
//!
//! Domain-specific error types for sari-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  sari-core errors (this file)                                          │
//! │  ├── CoreError        - Not found, insufficient stock                  │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  sari-db errors (separate crate)                                       │
//! │  └── DbError          - Local persistence failures                     │
//! │                                                                         │
//! │  sari-sync errors (separate crate)                                     │
//! │  └── StoreError       - What embedding applications see                │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StoreError → caller               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every engine operation validates before it builds a changeset, so a
//! `CoreError` always means nothing was changed.

use thiserror::Error;

use crate::types::{ProductId, SaleId};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    ///
    /// ## When This Occurs
    /// - Product id doesn't exist in the ledger
    /// - Product was deleted while a form still referenced it
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Sale cannot be found.
    #[error("Sale not found: {0}")]
    SaleNotFound(SaleId),

    /// Insufficient stock to complete a sale.
    ///
    /// ## User Workflow
    /// ```text
    /// Record sale (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Bear Brand", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 Bear Brand in stock"
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A supplier sheet could not be read as CSV.
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),
}

impl CoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::ProductNotFound(_) | CoreError::SaleNotFound(_))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be greater than zero.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., a barcode already used by another product).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
