//! # Inventory Operations
//!
//! Product lifecycle: create or merge by name, inline edits, deletion, and
//! the store settings that drive stock alerts.
//!
//! ## Create-or-Update Flow
//! ```text
//! ProductInput { name, category, barcode, quantity, prices }
//!      │
//!      ▼
//! validate fields ──► Err(Validation)
//!      │
//!      ▼
//! name matches existing (case-insensitive)?
//!      │
//!      ├── yes ──► quantity += input.quantity
//!      │           prices overwritten, category overwritten if given,
//!      │           barcode set if given (must not belong to another product)
//!      │
//!      └── no ───► barcode unique? ──► new product, totalSold 0, createdDate now
//! ```

use chrono::{DateTime, Duration, Utc};

use crate::changeset::{Changeset, Planned};
use crate::error::{CoreResult, ValidationError};
use crate::ledger::Ledger;
use crate::money::Money;
use crate::types::{PriceChangeReason, PriceHistoryEntry, Product, ProductId, Settings};
use crate::validation::{
    checked_stock_add, normalize_barcode, normalize_category, validate_business_name,
    validate_price, validate_product_name, validate_stock_quantity, validate_tax_rate,
};

/// Days without a sale after which a product is suggested for archiving.
pub const ARCHIVE_AFTER_DAYS: i64 = 90;

// =============================================================================
// Inputs & Outcomes
// =============================================================================

/// Product form input.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub name: String,
    pub category: Option<String>,
    pub barcode: Option<String>,
    pub quantity: i64,
    pub original_price: Money,
    pub selling_price: Money,
}

/// What `create_or_update_product` did.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductUpsert {
    Created(Product),
    /// An existing product with the same name absorbed the input.
    Updated { product: Product, quantity_added: i64 },
}

impl ProductUpsert {
    pub fn product(&self) -> &Product {
        match self {
            ProductUpsert::Created(p) => p,
            ProductUpsert::Updated { product, .. } => product,
        }
    }
}

/// Settings form input.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsInput {
    pub low_stock_threshold: i64,
    pub reorder_suggestions: bool,
    pub business_name: String,
    pub tax_rate: f64,
}

/// A product that has not sold in a while.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveCandidate {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i64,
    /// `None` when the product never sold.
    pub last_sale: Option<DateTime<Utc>>,
}

// =============================================================================
// Operations
// =============================================================================

/// Creates a product, or merges the input into the product with the same
/// name.
pub fn create_or_update_product(
    ledger: &Ledger,
    input: ProductInput,
    now: DateTime<Utc>,
) -> CoreResult<Planned<ProductUpsert>> {
    let name = validate_product_name(&input.name)?;
    validate_stock_quantity("quantity", input.quantity)?;
    validate_price("originalPrice", input.original_price)?;
    validate_price("sellingPrice", input.selling_price)?;
    let barcode = normalize_barcode(input.barcode.as_deref());

    let existing = ledger.product_by_name(&name);

    if let Some(code) = &barcode {
        if let Some(owner) = ledger.product_by_barcode(code) {
            if existing.map(|p| p.id) != Some(owner.id) {
                return Err(ValidationError::Duplicate {
                    field: "barcode".to_string(),
                    value: code.clone(),
                }
                .into());
            }
        }
    }

    let mut changes = Changeset::new();
    let outcome = match existing {
        Some(current) => {
            let mut product = current.clone();
            product.quantity =
                checked_stock_add("quantity", current.quantity, input.quantity)?;
            product.original_price = input.original_price;
            product.selling_price = input.selling_price;
            if input.category.as_deref().map(str::trim).is_some_and(|c| !c.is_empty()) {
                product.category = normalize_category(input.category.as_deref());
            }
            if barcode.is_some() {
                product.barcode = barcode;
            }
            changes.upsert_product(product.clone());
            ProductUpsert::Updated {
                product,
                quantity_added: input.quantity,
            }
        }
        None => {
            let product = Product {
                id: ledger.id_allocator(now).next_id(),
                name,
                category: normalize_category(input.category.as_deref()),
                barcode,
                quantity: input.quantity,
                original_price: input.original_price,
                selling_price: input.selling_price,
                total_sold: 0,
                created_date: Some(now),
            };
            changes.upsert_product(product.clone());
            ProductUpsert::Created(product)
        }
    };

    Ok(Planned::new(changes, outcome))
}

/// Removes a product. Sales and history entries keep their snapshots.
pub fn delete_product(ledger: &Ledger, product_id: ProductId) -> CoreResult<Planned<Product>> {
    let product = ledger.require_product(product_id)?.clone();
    let mut changes = Changeset::new();
    changes.remove_product(product_id);
    Ok(Planned::new(changes, product))
}

/// Sets absolute stock and prices from the inventory table.
///
/// A price change appends one `InlineEdit` history entry carrying the stock
/// level from before the edit.
pub fn update_product_inline(
    ledger: &Ledger,
    product_id: ProductId,
    quantity: i64,
    original_price: Money,
    selling_price: Money,
    now: DateTime<Utc>,
) -> CoreResult<Planned<Product>> {
    let current = ledger.require_product(product_id)?;
    validate_stock_quantity("quantity", quantity)?;
    validate_price("originalPrice", original_price)?;
    validate_price("sellingPrice", selling_price)?;

    let mut changes = Changeset::new();
    if current.original_price != original_price || current.selling_price != selling_price {
        changes.add_price_entry(PriceHistoryEntry::new(
            ledger.id_allocator(now).next_id(),
            now,
            current,
            current.original_price,
            current.selling_price,
            original_price,
            selling_price,
            PriceChangeReason::InlineEdit,
            current.quantity,
        ));
    }

    let mut product = current.clone();
    product.quantity = quantity;
    product.original_price = original_price;
    product.selling_price = selling_price;
    changes.upsert_product(product.clone());

    Ok(Planned::new(changes, product))
}

/// Replaces the store settings.
pub fn update_settings(input: SettingsInput) -> CoreResult<Planned<Settings>> {
    validate_stock_quantity("lowStockThreshold", input.low_stock_threshold)?;
    validate_tax_rate(input.tax_rate)?;
    let business_name = validate_business_name(&input.business_name)?;

    let settings = Settings {
        low_stock_threshold: input.low_stock_threshold,
        reorder_suggestions: input.reorder_suggestions,
        business_name,
        tax_rate: input.tax_rate,
    };
    let mut changes = Changeset::new();
    changes.set_settings(settings.clone());
    Ok(Planned::new(changes, settings))
}

/// Products with no sale in the last 90 days, or none ever. Advisory only.
pub fn archive_candidates(ledger: &Ledger, now: DateTime<Utc>) -> Vec<ArchiveCandidate> {
    let cutoff = now - Duration::days(ARCHIVE_AFTER_DAYS);
    ledger
        .products()
        .iter()
        .filter_map(|product| {
            let last_sale = ledger.sales_for(product.id).map(|s| s.date).max();
            match last_sale {
                Some(date) if date >= cutoff => None,
                _ => Some(ArchiveCandidate {
                    product_id: product.id,
                    name: product.name.clone(),
                    quantity: product.quantity,
                    last_sale,
                }),
            }
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::testing::{at, ledger_with, product, sale};

    fn input(name: &str, quantity: i64) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            category: Some("Snacks".to_string()),
            barcode: None,
            quantity,
            original_price: Money::from_cents(1000),
            selling_price: Money::from_cents(1500),
        }
    }

    #[test]
    fn test_create_new_product() {
        let ledger = Ledger::new();
        let now = at(2024, 3, 1);
        let planned = create_or_update_product(&ledger, input("Piattos", 10), now).unwrap();

        let ProductUpsert::Created(product) = &planned.outcome else {
            panic!("expected a new product");
        };
        assert_eq!(product.id, now.timestamp_millis());
        assert_eq!(product.total_sold, 0);
        assert_eq!(product.created_date, Some(now));
    }

    #[test]
    fn test_same_name_merges_into_existing_product() {
        let ledger = ledger_with(vec![product(1, "Piattos", 4)], vec![]);
        let mut update = input("PIATTOS", 6);
        update.selling_price = Money::from_cents(1800);
        update.category = None;

        let planned = create_or_update_product(&ledger, update, at(2024, 3, 1)).unwrap();
        let ProductUpsert::Updated { product, quantity_added } = planned.outcome else {
            panic!("expected an update");
        };
        assert_eq!(quantity_added, 6);
        assert_eq!(product.id, 1);
        assert_eq!(product.quantity, 10);
        assert_eq!(product.selling_price.cents(), 1800);
        assert_eq!(product.category, "Snacks");
        // No price history on the merge path
        assert!(planned.changes.price_entries().is_empty());
    }

    #[test]
    fn test_merge_rejects_stock_past_the_range() {
        let ledger = ledger_with(vec![product(1, "Piattos", 4)], vec![]);
        let result = create_or_update_product(&ledger, input("Piattos", i64::MAX), at(2024, 3, 1));
        assert!(matches!(
            result,
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_duplicate_barcode_is_rejected() {
        let mut owner = product(1, "Piattos", 4);
        owner.barcode = Some("4800016".to_string());
        let ledger = ledger_with(vec![owner, product(2, "Nova", 3)], vec![]);

        let mut new_product = input("Chippy", 5);
        new_product.barcode = Some("4800016".to_string());
        let err = create_or_update_product(&ledger, new_product, at(2024, 3, 1)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Duplicate { .. })
        ));

        // Same barcode on another product's update path is rejected too
        let mut other = input("Nova", 1);
        other.barcode = Some("4800016".to_string());
        assert!(create_or_update_product(&ledger, other, at(2024, 3, 1)).is_err());

        // Re-submitting the owner's own barcode is fine
        let mut own = input("Piattos", 1);
        own.barcode = Some("4800016".to_string());
        assert!(create_or_update_product(&ledger, own, at(2024, 3, 1)).is_ok());
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        let ledger = Ledger::new();
        assert!(create_or_update_product(&ledger, input("", 1), at(2024, 3, 1)).is_err());
        assert!(create_or_update_product(&ledger, input("Piattos", -1), at(2024, 3, 1)).is_err());

        let mut negative = input("Piattos", 1);
        negative.original_price = Money::from_cents(-1);
        assert!(create_or_update_product(&ledger, negative, at(2024, 3, 1)).is_err());
    }

    #[test]
    fn test_delete_product_keeps_sales() {
        let ledger = ledger_with(
            vec![product(1, "Piattos", 4)],
            vec![sale(10, 1, 2, at(2024, 3, 1))],
        );
        let planned = delete_product(&ledger, 1).unwrap();
        let mut after = ledger.clone();
        after.apply(planned.changes);
        assert!(after.products().is_empty());
        assert_eq!(after.sales().len(), 1);

        assert!(matches!(
            delete_product(&ledger, 99),
            Err(CoreError::ProductNotFound(99))
        ));
    }

    #[test]
    fn test_inline_edit_records_price_change() {
        let ledger = ledger_with(vec![product(1, "Piattos", 4)], vec![]);
        let planned = update_product_inline(
            &ledger,
            1,
            12,
            Money::from_cents(1000),
            Money::from_cents(2000),
            at(2024, 3, 1),
        )
        .unwrap();

        assert_eq!(planned.outcome.quantity, 12);
        let entries = planned.changes.price_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].reason, PriceChangeReason::InlineEdit);
        assert_eq!(entries[0].stock_at_time, 4);
        assert!((entries[0].new_margin - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_inline_edit_without_price_change_has_no_history() {
        let ledger = ledger_with(vec![product(1, "Piattos", 4)], vec![]);
        let planned = update_product_inline(
            &ledger,
            1,
            0,
            Money::from_cents(1000),
            Money::from_cents(1500),
            at(2024, 3, 1),
        )
        .unwrap();
        assert!(planned.changes.price_entries().is_empty());
        assert_eq!(planned.outcome.quantity, 0);
    }

    #[test]
    fn test_update_settings_validates() {
        let valid = SettingsInput {
            low_stock_threshold: 8,
            reorder_suggestions: false,
            business_name: "Aling Nena's Store".to_string(),
            tax_rate: 12.0,
        };
        let planned = update_settings(valid.clone()).unwrap();
        assert_eq!(planned.outcome.low_stock_threshold, 8);

        let mut bad = valid.clone();
        bad.tax_rate = 101.0;
        assert!(update_settings(bad).is_err());

        let mut bad = valid;
        bad.low_stock_threshold = -1;
        assert!(update_settings(bad).is_err());
    }

    #[test]
    fn test_archive_candidates() {
        let now = at(2024, 6, 30);
        let ledger = ledger_with(
            vec![
                product(1, "Fresh Seller", 4),
                product(2, "Stale Seller", 4),
                product(3, "Never Sold", 4),
            ],
            vec![
                sale(10, 1, 1, at(2024, 6, 1)),
                sale(11, 2, 1, at(2024, 1, 5)),
            ],
        );
        let names: Vec<_> = archive_candidates(&ledger, now)
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Stale Seller", "Never Sold"]);
    }
}
