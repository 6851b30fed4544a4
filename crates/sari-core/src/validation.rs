//! # Validation Module
//!
//! Input validation for the store engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (form / importer)                                     │
//! │  ├── Parsing text into numbers                                         │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine operation (sari-core)                                 │
//! │  ├── THIS MODULE: field rules                                          │
//! │  └── Ledger rules (uniqueness, stock) in the operation itself          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Changeset                                                    │
//! │  └── Only built once every check has passed                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use sari_core::validation::{validate_product_name, validate_positive_quantity};
//!
//! assert!(validate_product_name("Bear Brand 33g").is_ok());
//! assert!(validate_positive_quantity("quantity", 0).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::DEFAULT_CATEGORY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted product name, in characters.
pub const MAX_NAME_LENGTH: usize = 200;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name and returns it trimmed.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(name.to_string())
}

/// Trims a category, substituting `"Other"` when empty.
pub fn normalize_category(category: Option<&str>) -> String {
    match category.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => DEFAULT_CATEGORY.to_string(),
    }
}

/// Trims a barcode; empty means no barcode.
pub fn normalize_barcode(barcode: Option<&str>) -> Option<String> {
    barcode
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
}

/// Validates the business name shown on reports.
pub fn validate_business_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "businessName".to_string(),
        });
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "businessName".to_string(),
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(name.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity that must be strictly positive (sales, restocks).
///
/// ## User Workflow
/// ```text
/// Restock form: quantity 0
///      │
///      ▼
/// validate_positive_quantity("quantity", 0) ← THIS FUNCTION
///      │
///      └── Error: "quantity must be positive"
/// ```
pub fn validate_positive_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a stock level (zero allowed).
pub fn validate_stock_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Adds `added` units to `stock`, rejecting a total past the `i64` range.
pub fn checked_stock_add(field: &str, stock: i64, added: i64) -> ValidationResult<i64> {
    stock.checked_add(added).ok_or_else(|| out_of_range(field))
}

/// Prices `quantity` units at `unit`, rejecting a total past `Money`'s range.
pub fn checked_line_total(field: &str, unit: Money, quantity: i64) -> ValidationResult<Money> {
    unit.checked_mul(quantity).ok_or_else(|| out_of_range(field))
}

fn out_of_range(field: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0.0,
        max: i64::MAX as f64,
    }
}

/// Validates a price. Zero is allowed.
///
/// ## Example
/// ```rust
/// use sari_core::money::Money;
/// use sari_core::validation::validate_price;
///
/// assert!(validate_price("sellingPrice", Money::from_cents(1099)).is_ok());
/// assert!(validate_price("sellingPrice", Money::zero()).is_ok());
/// assert!(validate_price("sellingPrice", Money::from_cents(-1)).is_err());
/// ```
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a tax rate in percent (0..=100).
pub fn validate_tax_rate(rate: f64) -> ValidationResult<()> {
    if !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
        return Err(ValidationError::OutOfRange {
            field: "taxRate".to_string(),
            min: 0.0,
            max: 100.0,
        });
    }
    Ok(())
}

/// Validates a target margin for price adjustments (below 100%).
pub fn validate_target_margin(margin: f64) -> ValidationResult<()> {
    if !margin.is_finite() || margin >= 100.0 {
        return Err(ValidationError::OutOfRange {
            field: "targetMargin".to_string(),
            min: f64::NEG_INFINITY,
            max: 100.0,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_name() {
        assert_eq!(validate_product_name("  Skyflakes ").unwrap(), "Skyflakes");
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"A".repeat(200)).is_ok());
        assert!(validate_product_name(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_normalize_category_and_barcode() {
        assert_eq!(normalize_category(None), "Other");
        assert_eq!(normalize_category(Some("  ")), "Other");
        assert_eq!(normalize_category(Some(" Snacks ")), "Snacks");

        assert_eq!(normalize_barcode(Some("")), None);
        assert_eq!(normalize_barcode(Some(" 480 ")), Some("480".to_string()));
    }

    #[test]
    fn test_checked_stock_arithmetic() {
        assert_eq!(checked_stock_add("quantity", 5, 8), Ok(13));
        assert!(matches!(
            checked_stock_add("quantity", 5, i64::MAX),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "quantity"
        ));

        assert_eq!(
            checked_line_total("total", Money::from_cents(1250), 4),
            Ok(Money::from_cents(5000))
        );
        assert!(checked_line_total("total", Money::from_cents(1250), i64::MAX).is_err());
    }

    #[test]
    fn test_quantities() {
        assert!(validate_positive_quantity("quantity", 1).is_ok());
        assert!(validate_positive_quantity("quantity", 0).is_err());
        assert!(validate_stock_quantity("quantity", 0).is_ok());
        assert_eq!(
            validate_stock_quantity("quantity", -1),
            Err(ValidationError::MustBeNonNegative {
                field: "quantity".to_string()
            })
        );
    }

    #[test]
    fn test_validate_tax_rate() {
        assert!(validate_tax_rate(0.0).is_ok());
        assert!(validate_tax_rate(12.0).is_ok());
        assert!(validate_tax_rate(100.0).is_ok());
        assert!(validate_tax_rate(100.5).is_err());
        assert!(validate_tax_rate(-1.0).is_err());
        assert!(validate_tax_rate(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_target_margin() {
        assert!(validate_target_margin(30.0).is_ok());
        assert!(validate_target_margin(100.0).is_err());
    }
}
