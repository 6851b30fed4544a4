//! # Sales Operations
//!
//! Recording a sale moves stock out of a product; deleting it moves the
//! stock back.
//!
//! ## Sale Lifecycle
//! ```text
//! record_sale(product, qty)
//!      │
//!      ├── product missing      → ProductNotFound
//!      ├── qty ≤ 0              → Validation
//!      ├── qty > stock          → InsufficientStock
//!      │
//!      ▼
//! Sale { snapshot name + prices }   product.quantity -= qty
//!                                   product.totalSold += qty
//!      │
//!      ▼
//! delete_sale(sale)
//!      │
//!      ├── product still exists → quantity += qty, totalSold -= qty (≥ 0)
//!      └── product deleted      → sale removed, nothing restored
//! ```

use chrono::{DateTime, Utc};

use crate::changeset::{Changeset, Planned};
use crate::error::{CoreError, CoreResult};
use crate::ledger::Ledger;
use crate::types::{ProductId, Sale, SaleId};
use crate::validation::{checked_line_total, checked_stock_add, validate_positive_quantity};

/// What deleting a sale would do.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleDeletionPreview {
    pub sale: Sale,
    /// False when the product has since been deleted.
    pub product_exists: bool,
    pub units_to_restore: i64,
    /// Stock after restitution, when the product exists.
    pub resulting_stock: Option<i64>,
}

impl SaleDeletionPreview {
    /// Confirmation text for the caller to show.
    pub fn message(&self) -> String {
        if self.product_exists {
            format!(
                "This will restore {} units to {}",
                self.units_to_restore, self.sale.product_name
            )
        } else {
            format!(
                "{} no longer exists; no stock will be restored",
                self.sale.product_name
            )
        }
    }
}

/// Records a sale of `quantity` units at the product's current price.
pub fn record_sale(
    ledger: &Ledger,
    product_id: ProductId,
    quantity: i64,
    now: DateTime<Utc>,
) -> CoreResult<Planned<Sale>> {
    let product = ledger.require_product(product_id)?;
    validate_positive_quantity("quantity", quantity)?;

    if quantity > product.quantity {
        return Err(CoreError::InsufficientStock {
            product: product.name.clone(),
            available: product.quantity,
            requested: quantity,
        });
    }

    let sale = Sale {
        id: ledger.id_allocator(now).next_id(),
        date: now,
        product_id,
        product_name: product.name.clone(),
        quantity,
        unit_price: product.selling_price,
        original_price: product.original_price,
        total_amount: checked_line_total("totalAmount", product.selling_price, quantity)?,
    };

    let mut updated = product.clone();
    updated.quantity -= quantity;
    updated.total_sold = checked_stock_add("totalSold", product.total_sold, quantity)?;

    let mut changes = Changeset::new();
    changes.add_sale(sale.clone()).upsert_product(updated);
    Ok(Planned::new(changes, sale))
}

/// Describes the restitution `delete_sale` would perform.
pub fn preview_sale_deletion(ledger: &Ledger, sale_id: SaleId) -> CoreResult<SaleDeletionPreview> {
    let sale = ledger.require_sale(sale_id)?;
    let product = ledger.product(sale.product_id);
    Ok(SaleDeletionPreview {
        sale: sale.clone(),
        product_exists: product.is_some(),
        units_to_restore: if product.is_some() { sale.quantity } else { 0 },
        resulting_stock: product.map(|p| p.quantity.saturating_add(sale.quantity)),
    })
}

/// Removes a sale and restores its stock when the product still exists.
pub fn delete_sale(ledger: &Ledger, sale_id: SaleId) -> CoreResult<Planned<SaleDeletionPreview>> {
    let preview = preview_sale_deletion(ledger, sale_id)?;

    let mut changes = Changeset::new();
    if let Some(product) = ledger.product(preview.sale.product_id) {
        let mut restored = product.clone();
        restored.quantity =
            checked_stock_add("quantity", product.quantity, preview.sale.quantity)?;
        restored.total_sold = (restored.total_sold - preview.sale.quantity).max(0);
        changes.upsert_product(restored);
    }
    changes.remove_sale(sale_id);

    Ok(Planned::new(changes, preview))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Collection;
    use crate::money::Money;
    use crate::testing::{at, ledger_with, product};

    fn stocked() -> Ledger {
        let mut p = product(1, "Bear Brand", 10);
        p.selling_price = Money::from_cents(5000);
        ledger_with(vec![p], vec![])
    }

    #[test]
    fn test_record_then_delete_restores_product() {
        let mut ledger = stocked();
        let before = ledger.product(1).cloned().unwrap();

        let planned = record_sale(&ledger, 1, 3, at(2024, 3, 1)).unwrap();
        assert_eq!(planned.outcome.total_amount.cents(), 15000);
        let sale_id = planned.outcome.id;
        ledger.apply(planned.changes);

        let after_sale = ledger.product(1).unwrap();
        assert_eq!(after_sale.quantity, 7);
        assert_eq!(after_sale.total_sold, 3);

        let planned = delete_sale(&ledger, sale_id).unwrap();
        let touched: Vec<_> = planned.changes.touched().into_iter().collect();
        assert_eq!(touched, vec![Collection::Products, Collection::Sales]);
        ledger.apply(planned.changes);

        assert_eq!(ledger.product(1), Some(&before));
        assert!(ledger.sales().is_empty());
    }

    #[test]
    fn test_oversale_is_rejected() {
        let ledger = stocked();
        let err = record_sale(&ledger, 1, 11, at(2024, 3, 1)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 10,
                requested: 11,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_sale_inputs() {
        let ledger = stocked();
        assert!(matches!(
            record_sale(&ledger, 1, 0, at(2024, 3, 1)),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            record_sale(&ledger, 2, 1, at(2024, 3, 1)),
            Err(CoreError::ProductNotFound(2))
        ));
        assert!(matches!(
            delete_sale(&ledger, 5),
            Err(CoreError::SaleNotFound(5))
        ));
    }

    #[test]
    fn test_sale_totals_past_the_range_are_rejected() {
        let mut p = product(1, "Bear Brand", i64::MAX);
        p.selling_price = Money::from_cents(5000);
        let ledger = ledger_with(vec![p], vec![]);
        assert!(matches!(
            record_sale(&ledger, 1, i64::MAX / 10, at(2024, 3, 1)),
            Err(CoreError::Validation(_))
        ));

        let mut p = product(1, "Bear Brand", 10);
        p.total_sold = i64::MAX;
        let ledger = ledger_with(vec![p], vec![]);
        assert!(record_sale(&ledger, 1, 1, at(2024, 3, 1)).is_err());
    }

    #[test]
    fn test_delete_sale_of_deleted_product() {
        let mut ledger = stocked();
        let planned = record_sale(&ledger, 1, 2, at(2024, 3, 1)).unwrap();
        let sale_id = planned.outcome.id;
        ledger.apply(planned.changes);
        ledger.apply(crate::inventory::delete_product(&ledger, 1).unwrap().changes);

        let preview = preview_sale_deletion(&ledger, sale_id).unwrap();
        assert!(!preview.product_exists);
        assert_eq!(preview.units_to_restore, 0);

        let planned = delete_sale(&ledger, sale_id).unwrap();
        let touched: Vec<_> = planned.changes.touched().into_iter().collect();
        assert_eq!(touched, vec![Collection::Sales]);
    }

    #[test]
    fn test_preview_message() {
        let mut ledger = stocked();
        let planned = record_sale(&ledger, 1, 3, at(2024, 3, 1)).unwrap();
        let sale_id = planned.outcome.id;
        ledger.apply(planned.changes);

        let preview = preview_sale_deletion(&ledger, sale_id).unwrap();
        assert_eq!(preview.resulting_stock, Some(10));
        assert_eq!(preview.message(), "This will restore 3 units to Bear Brand");
    }

    #[test]
    fn test_total_sold_is_floored_at_zero() {
        let mut ledger = stocked();
        let planned = record_sale(&ledger, 1, 3, at(2024, 3, 1)).unwrap();
        let sale_id = planned.outcome.id;
        ledger.apply(planned.changes);

        // An inline edit can't touch totalSold, so simulate a legacy record
        let mut legacy = ledger.product(1).cloned().unwrap();
        legacy.total_sold = 1;
        let mut changes = Changeset::new();
        changes.upsert_product(legacy);
        ledger.apply(changes);

        ledger.apply(delete_sale(&ledger, sale_id).unwrap().changes);
        assert_eq!(ledger.product(1).unwrap().total_sold, 0);
    }
}
