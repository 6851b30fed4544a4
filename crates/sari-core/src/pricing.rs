//! # Pricing Engine
//!
//! Advisory price suggestions and batch price updates. Every applied price
//! change appends a [`PriceHistoryEntry`].
//!
//! ## Bulk Price Update
//! ```text
//! preview_bulk_price_changes(adjustment, target)      (read-only)
//!      │
//!      │   Percentage(p)   new = price × (1 + p/100)
//!      │   Fixed(a)        new = price + a
//!      │   TargetMargin(m) new = cost / (1 - m/100)     (m < 100)
//!      │
//!      │   entries with new ≤ 0 are dropped
//!      ▼
//! Vec<BulkPriceChange>  ──► caller reviews ──► apply_bulk_price_changes
//!                                                   │
//!                                 every entry valid? ├── no → Err, nothing applied
//!                                                   └── yes → history + new prices
//! ```

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::changeset::{Changeset, Planned};
use crate::error::{CoreResult, ValidationError};
use crate::ledger::Ledger;
use crate::money::{margin_percent, Money};
use crate::types::{PriceChangeReason, PriceHistoryEntry, Product, ProductId};
use crate::validation::validate_target_margin;

/// Weeks the lifetime transaction count is spread over.
const DEMAND_WEEKS: f64 = 4.0;

// =============================================================================
// Profit Optimization
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationKind {
    /// High demand, low margin.
    IncreasePrice,
    /// Low demand, high margin.
    DecreasePrice,
}

/// An advisory price suggestion.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfitOptimization {
    pub product_id: ProductId,
    pub product_name: String,
    pub kind: OptimizationKind,
    pub current_margin: f64,
    pub avg_sales_per_week: f64,
    pub current_price: Money,
    pub suggested_price: Money,
}

impl ProfitOptimization {
    pub fn message(&self) -> String {
        match self.kind {
            OptimizationKind::IncreasePrice => format!(
                "High demand, low margin ({:.1}%). Consider increasing price by {}",
                self.current_margin,
                self.suggested_price - self.current_price
            ),
            OptimizationKind::DecreasePrice => format!(
                "Low demand, high margin ({:.1}%). Consider reducing price to {} to boost sales",
                self.current_margin, self.suggested_price
            ),
        }
    }
}

/// Suggests price moves for products with at least one sale.
///
/// ```text
/// sales/week = transaction count / 4
/// > 5 per week and margin < 20%  → increase by 10%
/// < 1 per week and margin > 50%  → reduce to 90%
/// ```
pub fn profit_optimizations(ledger: &Ledger) -> Vec<ProfitOptimization> {
    ledger
        .products()
        .iter()
        .filter_map(|product| {
            let transactions = ledger.sales_for(product.id).count();
            if transactions == 0 {
                return None;
            }
            let per_week = transactions as f64 / DEMAND_WEEKS;
            let margin = product.margin_percent();

            let (kind, suggested_price) = if per_week > 5.0 && margin < 20.0 {
                (OptimizationKind::IncreasePrice, product.selling_price.scale(1.1))
            } else if per_week < 1.0 && margin > 50.0 {
                (OptimizationKind::DecreasePrice, product.selling_price.scale(0.9))
            } else {
                return None;
            };

            Some(ProfitOptimization {
                product_id: product.id,
                product_name: product.name.clone(),
                kind,
                current_margin: margin,
                avg_sales_per_week: per_week,
                current_price: product.selling_price,
                suggested_price,
            })
        })
        .collect()
}

// =============================================================================
// Bulk Price Changes
// =============================================================================

/// How to compute new selling prices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceAdjustment {
    /// Percent change, e.g. `10.0` for +10%.
    Percentage(f64),
    /// Fixed amount added to the price (may be negative).
    Fixed(Money),
    /// Price that yields this margin percent over cost.
    TargetMargin(f64),
}

/// Which products an adjustment applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceTarget {
    All,
    /// Quantity at or below the threshold.
    LowStock,
    /// Quantity above three times the threshold.
    HighStock,
}

impl PriceTarget {
    fn matches(&self, product: &Product, threshold: i64) -> bool {
        match self {
            PriceTarget::All => true,
            PriceTarget::LowStock => product.quantity <= threshold,
            PriceTarget::HighStock => product.quantity > threshold * 3,
        }
    }
}

/// One reviewed selling-price change.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkPriceChange {
    pub product_id: ProductId,
    pub product_name: String,
    pub old_price: Money,
    pub new_price: Money,
}

impl BulkPriceChange {
    pub fn change(&self) -> Money {
        self.new_price - self.old_price
    }
}

/// Computes the changes an adjustment would make. Read-only.
pub fn preview_bulk_price_changes(
    ledger: &Ledger,
    adjustment: PriceAdjustment,
    target: PriceTarget,
) -> CoreResult<Vec<BulkPriceChange>> {
    if let PriceAdjustment::TargetMargin(margin) = adjustment {
        validate_target_margin(margin)?;
    }
    let threshold = ledger.low_stock_threshold();

    Ok(ledger
        .products()
        .iter()
        .filter(|p| target.matches(p, threshold))
        .filter_map(|product| {
            let new_price = match adjustment {
                PriceAdjustment::Percentage(pct) => product.selling_price.scale(1.0 + pct / 100.0),
                PriceAdjustment::Fixed(amount) => product.selling_price + amount,
                PriceAdjustment::TargetMargin(margin) => {
                    product.original_price.scale(1.0 / (1.0 - margin / 100.0))
                }
            };
            new_price.is_positive().then(|| BulkPriceChange {
                product_id: product.id,
                product_name: product.name.clone(),
                old_price: product.selling_price,
                new_price,
            })
        })
        .collect())
}

/// Applies reviewed selling-price changes as one batch.
///
/// Every entry is validated before anything is planned; one bad entry
/// rejects the whole batch.
pub fn apply_bulk_price_changes(
    ledger: &Ledger,
    changes: &[BulkPriceChange],
    now: DateTime<Utc>,
) -> CoreResult<Planned<Vec<Product>>> {
    for change in changes {
        ledger.require_product(change.product_id)?;
        if !change.new_price.is_positive() {
            return Err(ValidationError::MustBePositive {
                field: "newPrice".to_string(),
            }
            .into());
        }
    }

    let mut ids = ledger.id_allocator(now);
    let mut staged: Vec<Product> = Vec::new();
    let mut index: HashMap<ProductId, usize> = HashMap::new();

    let mut changeset = Changeset::new();
    for change in changes {
        let slot = match index.get(&change.product_id) {
            Some(&slot) => slot,
            None => {
                staged.push(ledger.require_product(change.product_id)?.clone());
                index.insert(change.product_id, staged.len() - 1);
                staged.len() - 1
            }
        };
        let product = &mut staged[slot];

        changeset.add_price_entry(PriceHistoryEntry::new(
            ids.next_id(),
            now,
            product,
            product.original_price,
            product.selling_price,
            product.original_price,
            change.new_price,
            PriceChangeReason::BulkUpdate,
            product.quantity,
        ));
        product.selling_price = change.new_price;
    }

    for product in &staged {
        changeset.upsert_product(product.clone());
    }
    Ok(Planned::new(changeset, staged))
}

// =============================================================================
// Preview Helpers
// =============================================================================

/// Margin a new price would give, for preview tables.
pub fn projected_margin(product: &Product, new_price: Money) -> f64 {
    margin_percent(product.original_price, new_price)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::testing::{at, ledger_with, product, sale};

    fn priced(id: ProductId, name: &str, qty: i64, cost: i64, price: i64) -> Product {
        let mut p = product(id, name, qty);
        p.original_price = Money::from_cents(cost);
        p.selling_price = Money::from_cents(price);
        p
    }

    #[test]
    fn test_profit_optimizations() {
        // 24 transactions → 6/week at 10% margin
        let busy_sales: Vec<_> = (0..24)
            .map(|i| sale(100 + i, 1, 1, at(2024, 3, 1)))
            .collect();
        let mut sales = busy_sales;
        // 1 transaction → 0.25/week at 60% margin
        sales.push(sale(200, 2, 1, at(2024, 3, 1)));
        // 8 transactions → 2/week, no suggestion
        sales.extend((0..8).map(|i| sale(300 + i, 3, 1, at(2024, 3, 1))));

        let ledger = ledger_with(
            vec![
                priced(1, "Rice 1kg", 50, 4500, 5000),
                priced(2, "Imported Cookies", 5, 4000, 10000),
                priced(3, "Soap", 20, 2000, 3000),
                priced(4, "Unsold", 20, 100, 1000),
            ],
            sales,
        );

        let suggestions = profit_optimizations(&ledger);
        assert_eq!(suggestions.len(), 2);

        assert_eq!(suggestions[0].kind, OptimizationKind::IncreasePrice);
        assert_eq!(suggestions[0].suggested_price.cents(), 5500);
        assert_eq!(
            suggestions[0].message(),
            "High demand, low margin (10.0%). Consider increasing price by ₱5.00"
        );

        assert_eq!(suggestions[1].kind, OptimizationKind::DecreasePrice);
        assert_eq!(suggestions[1].suggested_price.cents(), 9000);
    }

    #[test]
    fn test_preview_percentage_on_low_stock() {
        let ledger = ledger_with(
            vec![priced(1, "Low", 3, 1000, 2000), priced(2, "High", 40, 1000, 2000)],
            vec![],
        );
        let changes = preview_bulk_price_changes(
            &ledger,
            PriceAdjustment::Percentage(10.0),
            PriceTarget::LowStock,
        )
        .unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].new_price.cents(), 2200);
        assert_eq!(changes[0].change().cents(), 200);

        let changes = preview_bulk_price_changes(
            &ledger,
            PriceAdjustment::Percentage(10.0),
            PriceTarget::HighStock,
        )
        .unwrap();
        assert_eq!(changes[0].product_name, "High");
    }

    #[test]
    fn test_preview_target_margin_and_fixed() {
        let ledger = ledger_with(vec![priced(1, "Item", 3, 1500, 2000)], vec![]);
        let changes = preview_bulk_price_changes(
            &ledger,
            PriceAdjustment::TargetMargin(25.0),
            PriceTarget::All,
        )
        .unwrap();
        assert_eq!(changes[0].new_price.cents(), 2000);

        // Prices that would drop to zero or below are skipped
        let changes = preview_bulk_price_changes(
            &ledger,
            PriceAdjustment::Fixed(Money::from_cents(-2000)),
            PriceTarget::All,
        )
        .unwrap();
        assert!(changes.is_empty());

        assert!(preview_bulk_price_changes(
            &ledger,
            PriceAdjustment::TargetMargin(100.0),
            PriceTarget::All
        )
        .is_err());
    }

    #[test]
    fn test_apply_bulk_changes() {
        let ledger = ledger_with(vec![priced(1, "Item", 7, 1000, 2000)], vec![]);
        let changes =
            preview_bulk_price_changes(&ledger, PriceAdjustment::Percentage(50.0), PriceTarget::All)
                .unwrap();
        let planned = apply_bulk_price_changes(&ledger, &changes, at(2024, 3, 1)).unwrap();

        assert_eq!(planned.outcome[0].selling_price.cents(), 3000);
        let entries = planned.changes.price_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].reason, PriceChangeReason::BulkUpdate);
        assert_eq!(entries[0].stock_at_time, 7);
        assert_eq!(entries[0].old_original_price, entries[0].new_original_price);
    }

    #[test]
    fn test_apply_bulk_changes_is_all_or_nothing() {
        let ledger = ledger_with(vec![priced(1, "Item", 7, 1000, 2000)], vec![]);
        let changes = vec![
            BulkPriceChange {
                product_id: 1,
                product_name: "Item".into(),
                old_price: Money::from_cents(2000),
                new_price: Money::from_cents(2500),
            },
            BulkPriceChange {
                product_id: 99,
                product_name: "Gone".into(),
                old_price: Money::from_cents(2000),
                new_price: Money::from_cents(2500),
            },
        ];
        assert!(matches!(
            apply_bulk_price_changes(&ledger, &changes, at(2024, 3, 1)),
            Err(CoreError::ProductNotFound(99))
        ));

        let zero = vec![BulkPriceChange {
            product_id: 1,
            product_name: "Item".into(),
            old_price: Money::from_cents(2000),
            new_price: Money::zero(),
        }];
        assert!(apply_bulk_price_changes(&ledger, &zero, at(2024, 3, 1)).is_err());
    }

    #[test]
    fn test_projected_margin() {
        let item = priced(1, "Item", 1, 1000, 2000);
        assert!((projected_margin(&item, Money::from_cents(4000)) - 75.0).abs() < 1e-9);
    }
}
