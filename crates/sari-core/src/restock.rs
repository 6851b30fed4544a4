//! # Restock Engine
//!
//! Adding stock, optionally with new prices, and keeping the product,
//! price history and restock history consistent in one changeset.
//!
//! ## Manual Restock
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  restock(product, +R, new cost?, new price?, notes?)                    │
//! │                                                                         │
//! │  1. snapshot stock S and prices (cost C, price P)                       │
//! │  2. quantity = S + R                                                    │
//! │  3. cost given, > 0 and ≠ C   → PriceHistory "Restock - Original ..."   │
//! │        cost applied first                                               │
//! │  4. price given, > 0 and ≠ P  → PriceHistory "Restock - Selling ..."    │
//! │        old/new cost on this entry = the already-updated cost            │
//! │     both entries: stockAtTime = S                                       │
//! │  5. RestockHistory { +R, previous S, after S+R, "Original: ₱C → ₱C'" }  │
//! │                                                                         │
//! │  products + priceHistory + restockHistory commit together              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Supplier Import
//! ```text
//! supplier sheet ──► parse_supplier_csv ──► rows
//!                                            │
//!        name matches a product? ── yes ──► quantity += row.qty
//!                │                           prices differ → PriceHistory
//!                │                             "CSV Import Price Update"
//!                no ──► new product           (stockAtTime = before)
//!                │                           │
//!                └──────────┬────────────────┘
//!                           ▼
//!     RestockHistory "Imported from CSV - Supplier: X", stockAfter
//! ```
//!
//! ## Reorder Suggestions
//! ```text
//! velocity  = units sold in the last 30 days / 4   (units per week, 0 → 1)
//! suggested = ceil(velocity × 4) + threshold
//! ```

use chrono::{DateTime, Duration, Utc};
use std::cmp::Ordering;
use std::fmt;

use crate::changeset::{Changeset, Planned};
use crate::error::{CoreResult, ValidationError};
use crate::ledger::{IdAllocator, Ledger};
use crate::money::Money;
use crate::types::{
    PriceChangeReason, PriceHistoryEntry, Product, ProductId, RestockHistoryEntry, RestockKind,
    NO_PRICE_CHANGES,
};
use crate::validation::{
    checked_line_total, checked_stock_add, normalize_category, validate_positive_quantity,
    validate_price, validate_product_name,
};

/// Sales window used for velocity.
pub const VELOCITY_WINDOW_DAYS: i64 = 30;

/// Weeks of stock a reorder suggestion covers.
pub const REORDER_WEEKS: f64 = 4.0;

// =============================================================================
// Inputs & Outcomes
// =============================================================================

/// A manual restock from the restock form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RestockRequest {
    pub product_id: ProductId,
    pub quantity_added: i64,
    pub new_original_price: Option<Money>,
    pub new_selling_price: Option<Money>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Original,
    Selling,
}

/// One applied price change.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceChange {
    pub field: PriceField,
    pub old: Money,
    pub new: Money,
}

impl fmt::Display for PriceChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.field {
            PriceField::Original => "Original",
            PriceField::Selling => "Selling",
        };
        write!(f, "{}: {} → {}", label, self.old, self.new)
    }
}

/// Result of a single-product restock.
#[derive(Debug, Clone, PartialEq)]
pub struct RestockOutcome {
    pub product: Product,
    pub price_changes: Vec<PriceChange>,
    pub entry: RestockHistoryEntry,
}

/// Where a quick restock was triggered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickRestockSource {
    FromLowStockAlert,
    Inventory,
}

impl QuickRestockSource {
    pub fn kind(&self) -> RestockKind {
        match self {
            QuickRestockSource::FromLowStockAlert => RestockKind::QuickFromAlert,
            QuickRestockSource::Inventory => RestockKind::Quick,
        }
    }
}

/// Result of a bulk restock.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkRestockOutcome {
    /// No product was at or below the low-stock threshold.
    NothingToRestock,
    Restocked(Vec<RestockHistoryEntry>),
}

impl BulkRestockOutcome {
    pub fn restocked_count(&self) -> usize {
        match self {
            BulkRestockOutcome::NothingToRestock => 0,
            BulkRestockOutcome::Restocked(entries) => entries.len(),
        }
    }
}

/// A suggested reorder for one low-stock product.
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderSuggestion {
    pub product_id: ProductId,
    pub product_name: String,
    pub current_quantity: i64,
    /// Units per week over the last 30 days.
    pub sales_velocity: f64,
    pub suggested_quantity: i64,
}

/// Reorder suggestions plus the display preference from settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderSuggestions {
    /// Mirrors `settings.reorderSuggestions`; suggestions are computed either way.
    pub enabled: bool,
    pub items: Vec<ReorderSuggestion>,
}

// =============================================================================
// Shared helpers
// =============================================================================

#[allow(clippy::too_many_arguments)]
fn restock_entry(
    ids: &mut IdAllocator,
    now: DateTime<Utc>,
    product: &Product,
    quantity_added: i64,
    previous_quantity: i64,
    kind: RestockKind,
    notes: Option<String>,
    price_changes: &[PriceChange],
) -> CoreResult<RestockHistoryEntry> {
    let price_changes = if price_changes.is_empty() {
        NO_PRICE_CHANGES.to_string()
    } else {
        price_changes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    let notes = notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| kind.default_notes().to_string());

    let total_cost = checked_line_total("totalCost", product.original_price, quantity_added)?;

    Ok(RestockHistoryEntry {
        id: ids.next_id(),
        date: now,
        product_id: product.id,
        product_name: product.name.clone(),
        quantity_added,
        previous_quantity,
        stock_after: product.quantity,
        price_changes,
        notes,
        kind,
        original_price: product.original_price,
        selling_price: product.selling_price,
        total_cost,
    })
}

/// Adds stock without touching prices and appends the history entry.
fn add_stock(
    changes: &mut Changeset,
    ids: &mut IdAllocator,
    now: DateTime<Utc>,
    product: &Product,
    quantity_added: i64,
    kind: RestockKind,
) -> CoreResult<(Product, RestockHistoryEntry)> {
    let mut updated = product.clone();
    updated.quantity = checked_stock_add("quantity", product.quantity, quantity_added)?;
    let entry = restock_entry(
        ids,
        now,
        &updated,
        quantity_added,
        product.quantity,
        kind,
        None,
        &[],
    )?;
    changes
        .upsert_product(updated.clone())
        .add_restock_entry(entry.clone());
    Ok((updated, entry))
}

// =============================================================================
// Operations
// =============================================================================

/// Manual restock with optional price updates.
pub fn restock(
    ledger: &Ledger,
    request: RestockRequest,
    now: DateTime<Utc>,
) -> CoreResult<Planned<RestockOutcome>> {
    let current = ledger.require_product(request.product_id)?;
    validate_positive_quantity("quantity", request.quantity_added)?;
    if let Some(price) = request.new_original_price {
        validate_price("originalPrice", price)?;
    }
    if let Some(price) = request.new_selling_price {
        validate_price("sellingPrice", price)?;
    }

    let stock_before = current.quantity;
    let mut ids = ledger.id_allocator(now);
    let mut changes = Changeset::new();
    let mut price_changes = Vec::new();

    let mut product = current.clone();
    product.quantity = checked_stock_add("quantity", stock_before, request.quantity_added)?;

    if let Some(new_cost) = request
        .new_original_price
        .filter(|p| p.is_positive() && *p != product.original_price)
    {
        let old_cost = product.original_price;
        changes.add_price_entry(PriceHistoryEntry::new(
            ids.next_id(),
            now,
            &product,
            old_cost,
            product.selling_price,
            new_cost,
            product.selling_price,
            PriceChangeReason::RestockOriginalPrice,
            stock_before,
        ));
        product.original_price = new_cost;
        price_changes.push(PriceChange {
            field: PriceField::Original,
            old: old_cost,
            new: new_cost,
        });
    }

    if let Some(new_price) = request
        .new_selling_price
        .filter(|p| p.is_positive() && *p != product.selling_price)
    {
        let old_price = product.selling_price;
        changes.add_price_entry(PriceHistoryEntry::new(
            ids.next_id(),
            now,
            &product,
            product.original_price,
            old_price,
            product.original_price,
            new_price,
            PriceChangeReason::RestockSellingPrice,
            stock_before,
        ));
        product.selling_price = new_price;
        price_changes.push(PriceChange {
            field: PriceField::Selling,
            old: old_price,
            new: new_price,
        });
    }

    let entry = restock_entry(
        &mut ids,
        now,
        &product,
        request.quantity_added,
        stock_before,
        RestockKind::Manual,
        request.notes,
        &price_changes,
    )?;
    changes
        .upsert_product(product.clone())
        .add_restock_entry(entry.clone());

    Ok(Planned::new(
        changes,
        RestockOutcome {
            product,
            price_changes,
            entry,
        },
    ))
}

/// Restock without price changes, from an alert or the inventory table.
pub fn quick_restock(
    ledger: &Ledger,
    product_id: ProductId,
    quantity_added: i64,
    source: QuickRestockSource,
    now: DateTime<Utc>,
) -> CoreResult<Planned<RestockOutcome>> {
    let current = ledger.require_product(product_id)?;
    validate_positive_quantity("quantity", quantity_added)?;

    let mut changes = Changeset::new();
    let mut ids = ledger.id_allocator(now);
    let (product, entry) = add_stock(
        &mut changes,
        &mut ids,
        now,
        current,
        quantity_added,
        source.kind(),
    )?;
    Ok(Planned::new(
        changes,
        RestockOutcome {
            product,
            price_changes: Vec::new(),
            entry,
        },
    ))
}

/// Default amount offered by the quick restock prompt.
///
/// ```text
/// out of stock → 20
/// otherwise    → max(10, threshold + 10)
/// ```
pub fn suggested_quick_restock_amount(product: &Product, threshold: i64) -> i64 {
    if product.quantity <= 0 {
        20
    } else {
        10.max(threshold + 10)
    }
}

/// Reorder suggestions for every product at or below the threshold, fastest
/// sellers first.
pub fn reorder_suggestions(ledger: &Ledger, now: DateTime<Utc>) -> ReorderSuggestions {
    let threshold = ledger.low_stock_threshold();
    let window_start = now - Duration::days(VELOCITY_WINDOW_DAYS);

    let mut items: Vec<ReorderSuggestion> = ledger
        .products()
        .iter()
        .filter(|p| p.is_low_stock(threshold))
        .map(|product| {
            let recent_units: i64 = ledger
                .sales_for(product.id)
                .filter(|s| s.date >= window_start)
                .map(|s| s.quantity)
                .sum();
            let velocity = if recent_units == 0 {
                1.0
            } else {
                recent_units as f64 / REORDER_WEEKS
            };
            ReorderSuggestion {
                product_id: product.id,
                product_name: product.name.clone(),
                current_quantity: product.quantity,
                sales_velocity: velocity,
                suggested_quantity: (velocity * REORDER_WEEKS).ceil() as i64 + threshold,
            }
        })
        .collect();

    items.sort_by(|a, b| {
        b.sales_velocity
            .partial_cmp(&a.sales_velocity)
            .unwrap_or(Ordering::Equal)
    });

    ReorderSuggestions {
        enabled: ledger.settings().reorder_suggestions,
        items,
    }
}

/// Restocks every low-stock product by its reorder suggestion.
pub fn bulk_restock_suggested(
    ledger: &Ledger,
    now: DateTime<Utc>,
) -> CoreResult<Planned<BulkRestockOutcome>> {
    let suggestions = reorder_suggestions(ledger, now);
    let mut changes = Changeset::new();
    let mut ids = ledger.id_allocator(now);
    let mut entries = Vec::new();

    for suggestion in &suggestions.items {
        let product = ledger.require_product(suggestion.product_id)?;
        let (_, entry) = add_stock(
            &mut changes,
            &mut ids,
            now,
            product,
            suggestion.suggested_quantity,
            RestockKind::BulkSuggestion,
        )?;
        entries.push(entry);
    }

    Ok(Planned::new(changes, bulk_outcome(entries)))
}

/// Restocks every low-stock product by the same amount.
pub fn bulk_restock_uniform(
    ledger: &Ledger,
    amount: i64,
    now: DateTime<Utc>,
) -> CoreResult<Planned<BulkRestockOutcome>> {
    if amount <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        }
        .into());
    }

    let threshold = ledger.low_stock_threshold();
    let mut changes = Changeset::new();
    let mut ids = ledger.id_allocator(now);
    let mut entries = Vec::new();
    for product in ledger.products().iter().filter(|p| p.is_low_stock(threshold)) {
        let (_, entry) = add_stock(
            &mut changes,
            &mut ids,
            now,
            product,
            amount,
            RestockKind::BulkUniform,
        )?;
        entries.push(entry);
    }

    Ok(Planned::new(changes, bulk_outcome(entries)))
}

fn bulk_outcome(entries: Vec<RestockHistoryEntry>) -> BulkRestockOutcome {
    if entries.is_empty() {
        BulkRestockOutcome::NothingToRestock
    } else {
        BulkRestockOutcome::Restocked(entries)
    }
}

// =============================================================================
// Supplier Import
// =============================================================================

/// Supplier name recorded when a row leaves the column empty.
pub const UNKNOWN_SUPPLIER: &str = "Unknown Supplier";

/// One delivery line from a supplier sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SupplierImportRow {
    pub name: String,
    pub quantity: i64,
    pub original_price: Money,
    pub selling_price: Money,
    pub supplier: Option<String>,
}

/// Result of a supplier import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupplierImportReport {
    /// Rows whose name matched no product, added as new products.
    pub created: Vec<Product>,
    /// Existing products after their stock (and prices) were updated.
    pub restocked: Vec<Product>,
    /// Names of rows missing a name, a positive quantity or positive prices.
    pub skipped: Vec<String>,
    pub entries: Vec<RestockHistoryEntry>,
}

impl SupplierImportReport {
    pub fn imported_count(&self) -> usize {
        self.entries.len()
    }
}

/// Reads a supplier sheet with the columns
/// `Product Name, Quantity, Original Price, Selling Price, Supplier`.
///
/// The first line is a header. Unparseable numbers read as zero so the row
/// is reported as skipped by [`import_supplier_restock`].
///
/// ## Example
/// ```rust
/// use sari_core::restock::parse_supplier_csv;
///
/// let rows = parse_supplier_csv(
///     "Product Name,Quantity,Original Price,Selling Price,Supplier\n\
///      Coke 1.5L,24,65.00,75.00,Coca-Cola FEMSA\n",
/// )
/// .unwrap();
/// assert_eq!(rows[0].quantity, 24);
/// assert_eq!(rows[0].selling_price.cents(), 7500);
/// ```
pub fn parse_supplier_csv(text: &str) -> CoreResult<Vec<SupplierImportRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let amount = |i: usize| {
            Money::from_major(record.get(i).unwrap_or("0").parse::<f64>().unwrap_or(0.0))
        };
        rows.push(SupplierImportRow {
            name: record.get(0).unwrap_or("").to_string(),
            quantity: record.get(1).unwrap_or("0").parse::<i64>().unwrap_or(0),
            original_price: amount(2),
            selling_price: amount(3),
            supplier: record.get(4).filter(|s| !s.is_empty()).map(str::to_string),
        });
    }
    Ok(rows)
}

/// Receives a supplier delivery.
///
/// Rows are matched to products by name, case-insensitively. A match gets
/// the quantity added and, when either price differs, one price history
/// entry (reason `CsvImport`, stockAtTime = stock before the delivery)
/// before the new prices apply. An unmatched name becomes a new product.
/// Every imported row appends a restock entry noting the supplier.
///
/// Rows without a name, a positive quantity and positive prices are
/// skipped. A stock or cost total past the representable range fails the
/// whole import.
pub fn import_supplier_restock(
    ledger: &Ledger,
    rows: Vec<SupplierImportRow>,
    now: DateTime<Utc>,
) -> CoreResult<Planned<SupplierImportReport>> {
    let mut ids = ledger.id_allocator(now);
    let mut changes = Changeset::new();
    let mut report = SupplierImportReport::default();

    for row in rows {
        let name = match validate_product_name(&row.name) {
            Ok(name)
                if row.quantity > 0
                    && row.original_price.is_positive()
                    && row.selling_price.is_positive() =>
            {
                name
            }
            _ => {
                report.skipped.push(row.name.trim().to_string());
                continue;
            }
        };
        let supplier = row
            .supplier
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_SUPPLIER);
        let notes = format!("{} - Supplier: {}", RestockKind::CsvImport.as_str(), supplier);

        let existing = report
            .created
            .iter()
            .chain(report.restocked.iter())
            .find(|p| p.has_name(&name))
            .or_else(|| ledger.product_by_name(&name))
            .cloned();

        let Some(current) = existing else {
            let product = Product {
                id: ids.next_id(),
                name,
                category: normalize_category(None),
                barcode: None,
                quantity: row.quantity,
                original_price: row.original_price,
                selling_price: row.selling_price,
                total_sold: 0,
                created_date: Some(now),
            };
            let entry = restock_entry(
                &mut ids,
                now,
                &product,
                row.quantity,
                0,
                RestockKind::CsvImport,
                Some(notes),
                &[],
            )?;
            changes
                .upsert_product(product.clone())
                .add_restock_entry(entry.clone());
            report.created.push(product);
            report.entries.push(entry);
            continue;
        };

        let stock_before = current.quantity;
        let mut product = current;
        product.quantity = checked_stock_add("quantity", stock_before, row.quantity)?;

        let mut price_changes = Vec::new();
        if product.original_price != row.original_price {
            price_changes.push(PriceChange {
                field: PriceField::Original,
                old: product.original_price,
                new: row.original_price,
            });
        }
        if product.selling_price != row.selling_price {
            price_changes.push(PriceChange {
                field: PriceField::Selling,
                old: product.selling_price,
                new: row.selling_price,
            });
        }
        if !price_changes.is_empty() {
            changes.add_price_entry(PriceHistoryEntry::new(
                ids.next_id(),
                now,
                &product,
                product.original_price,
                product.selling_price,
                row.original_price,
                row.selling_price,
                PriceChangeReason::CsvImport,
                stock_before,
            ));
            product.original_price = row.original_price;
            product.selling_price = row.selling_price;
        }

        let entry = restock_entry(
            &mut ids,
            now,
            &product,
            row.quantity,
            stock_before,
            RestockKind::CsvImport,
            Some(notes),
            &price_changes,
        )?;
        changes
            .upsert_product(product.clone())
            .add_restock_entry(entry.clone());
        report.entries.push(entry);

        if let Some(created) = report.created.iter_mut().find(|p| p.id == product.id) {
            *created = product;
        } else if let Some(seen) = report.restocked.iter_mut().find(|p| p.id == product.id) {
            *seen = product;
        } else {
            report.restocked.push(product);
        }
    }

    Ok(Planned::new(changes, report))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::ledger::Collection;
    use crate::testing::{at, ledger_with, ledger_with_settings, product, sale};
    use crate::types::Settings;

    fn bear_brand(quantity: i64) -> Product {
        let mut p = product(1, "Bear Brand", quantity);
        p.original_price = Money::from_cents(1000);
        p.selling_price = Money::from_cents(2000);
        p
    }

    #[test]
    fn test_restock_with_new_selling_price() {
        let ledger = ledger_with(vec![bear_brand(2)], vec![]);
        let request = RestockRequest {
            product_id: 1,
            quantity_added: 8,
            new_selling_price: Some(Money::from_cents(2500)),
            ..RestockRequest::default()
        };
        let planned = restock(&ledger, request, at(2024, 3, 1)).unwrap();

        assert_eq!(planned.outcome.product.quantity, 10);
        assert_eq!(planned.outcome.product.selling_price.cents(), 2500);

        let entries = planned.changes.price_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].reason, PriceChangeReason::RestockSellingPrice);
        assert!((entries[0].old_margin - 50.0).abs() < 1e-9);
        assert!((entries[0].new_margin - 60.0).abs() < 1e-9);
        assert_eq!(entries[0].stock_at_time, 2);

        let entry = &planned.outcome.entry;
        assert_eq!(entry.quantity_added, 8);
        assert_eq!(entry.previous_quantity, 2);
        assert_eq!(entry.stock_after, 10);
        assert_eq!(entry.price_changes, "Selling: ₱20.00 → ₱25.00");
        assert_eq!(entry.notes, "No notes");
        assert_eq!(entry.total_cost.cents(), 8000);

        let touched: Vec<_> = planned.changes.touched().into_iter().collect();
        assert_eq!(
            touched,
            vec![
                Collection::Products,
                Collection::PriceHistory,
                Collection::RestockHistory
            ]
        );
    }

    #[test]
    fn test_restock_without_price_change() {
        let ledger = ledger_with(vec![bear_brand(2)], vec![]);
        let request = RestockRequest {
            product_id: 1,
            quantity_added: 5,
            new_selling_price: Some(Money::from_cents(2000)),
            notes: Some("From Puregold".to_string()),
            ..RestockRequest::default()
        };
        let planned = restock(&ledger, request, at(2024, 3, 1)).unwrap();

        assert!(planned.changes.price_entries().is_empty());
        assert_eq!(planned.outcome.entry.stock_after, 7);
        assert_eq!(planned.outcome.entry.price_changes, "No price changes");
        assert_eq!(planned.outcome.entry.notes, "From Puregold");
    }

    #[test]
    fn test_selling_entry_uses_updated_original_price() {
        let ledger = ledger_with(vec![bear_brand(2)], vec![]);
        let request = RestockRequest {
            product_id: 1,
            quantity_added: 4,
            new_original_price: Some(Money::from_cents(1200)),
            new_selling_price: Some(Money::from_cents(2400)),
            ..RestockRequest::default()
        };
        let planned = restock(&ledger, request, at(2024, 3, 1)).unwrap();
        let entries = planned.changes.price_entries();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].reason, PriceChangeReason::RestockOriginalPrice);
        assert_eq!(entries[0].old_original_price.cents(), 1000);
        assert_eq!(entries[0].new_original_price.cents(), 1200);

        assert_eq!(entries[1].old_original_price.cents(), 1200);
        assert_eq!(entries[1].new_original_price.cents(), 1200);
        assert!((entries[1].new_margin - 50.0).abs() < 1e-9);
        assert_ne!(entries[0].id, entries[1].id);

        assert_eq!(
            planned.outcome.entry.price_changes,
            "Original: ₱10.00 → ₱12.00, Selling: ₱20.00 → ₱24.00"
        );
        assert_eq!(planned.outcome.entry.total_cost.cents(), 4800);
    }

    #[test]
    fn test_restock_rejects_bad_input() {
        let ledger = ledger_with(vec![bear_brand(2)], vec![]);
        let zero = RestockRequest {
            product_id: 1,
            quantity_added: 0,
            ..RestockRequest::default()
        };
        assert!(matches!(
            restock(&ledger, zero, at(2024, 3, 1)),
            Err(CoreError::Validation(_))
        ));

        let negative_price = RestockRequest {
            product_id: 1,
            quantity_added: 1,
            new_original_price: Some(Money::from_cents(-100)),
            ..RestockRequest::default()
        };
        assert!(restock(&ledger, negative_price, at(2024, 3, 1)).is_err());

        let missing = RestockRequest {
            product_id: 9,
            quantity_added: 1,
            ..RestockRequest::default()
        };
        assert!(matches!(
            restock(&ledger, missing, at(2024, 3, 1)),
            Err(CoreError::ProductNotFound(9))
        ));
    }

    #[test]
    fn test_restock_rejects_quantities_past_the_stock_range() {
        let ledger = ledger_with(vec![bear_brand(5)], vec![]);
        let request = RestockRequest {
            product_id: 1,
            quantity_added: i64::MAX,
            ..RestockRequest::default()
        };
        assert!(matches!(
            restock(&ledger, request, at(2024, 3, 1)),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        // stock fits but the cost of the delivery does not
        let ledger = ledger_with(vec![bear_brand(0)], vec![]);
        let request = RestockRequest {
            product_id: 1,
            quantity_added: i64::MAX / 2,
            ..RestockRequest::default()
        };
        assert!(matches!(
            restock(&ledger, request, at(2024, 3, 1)),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        let ledger = ledger_with(vec![bear_brand(3)], vec![]);
        assert!(bulk_restock_uniform(&ledger, i64::MAX, at(2024, 3, 1)).is_err());
        assert!(quick_restock(
            &ledger,
            1,
            i64::MAX,
            QuickRestockSource::Inventory,
            at(2024, 3, 1)
        )
        .is_err());
    }

    #[test]
    fn test_quick_restock_kinds() {
        let ledger = ledger_with(vec![bear_brand(1)], vec![]);
        let planned =
            quick_restock(&ledger, 1, 20, QuickRestockSource::FromLowStockAlert, at(2024, 3, 1))
                .unwrap();
        assert_eq!(planned.outcome.product.quantity, 21);
        assert_eq!(planned.outcome.entry.kind, RestockKind::QuickFromAlert);
        assert_eq!(planned.outcome.entry.notes, "Quick restock from low stock alert");

        let planned =
            quick_restock(&ledger, 1, 5, QuickRestockSource::Inventory, at(2024, 3, 1)).unwrap();
        assert_eq!(planned.outcome.entry.kind, RestockKind::Quick);
        assert!(planned.changes.price_entries().is_empty());
    }

    #[test]
    fn test_suggested_quick_restock_amount() {
        assert_eq!(suggested_quick_restock_amount(&bear_brand(0), 5), 20);
        assert_eq!(suggested_quick_restock_amount(&bear_brand(2), 5), 15);
        assert_eq!(suggested_quick_restock_amount(&bear_brand(2), 0), 10);
    }

    #[test]
    fn test_reorder_suggestion_without_recent_sales() {
        let ledger = ledger_with(vec![bear_brand(3), product(2, "Plenty", 50)], vec![]);
        let suggestions = reorder_suggestions(&ledger, at(2024, 3, 1));

        assert!(suggestions.enabled);
        assert_eq!(suggestions.items.len(), 1);
        assert_eq!(suggestions.items[0].sales_velocity, 1.0);
        assert_eq!(suggestions.items[0].suggested_quantity, 9);
    }

    #[test]
    fn test_reorder_suggestions_sorted_by_velocity() {
        let now = at(2024, 3, 31);
        let ledger = ledger_with(
            vec![product(1, "Slow", 2), product(2, "Fast", 1), product(3, "Idle", 0)],
            vec![
                sale(10, 1, 2, at(2024, 3, 20)),
                sale(11, 2, 10, at(2024, 3, 25)),
                sale(12, 2, 6, at(2024, 3, 26)),
                // Outside the 30-day window
                sale(13, 1, 40, at(2024, 2, 1)),
            ],
        );
        let items = reorder_suggestions(&ledger, now).items;
        let names: Vec<_> = items.iter().map(|s| s.product_name.as_str()).collect();
        // Slow: 2/4 = 0.5, Fast: 16/4 = 4, Idle: default 1
        assert_eq!(names, vec!["Fast", "Idle", "Slow"]);
        assert_eq!(items[0].suggested_quantity, 16 + 5);
        assert_eq!(items[2].suggested_quantity, 2 + 5);
    }

    #[test]
    fn test_reorder_flag_is_reported_not_enforced() {
        let settings = Settings {
            reorder_suggestions: false,
            ..Settings::default()
        };
        let ledger = ledger_with_settings(vec![bear_brand(1)], vec![], settings);
        let suggestions = reorder_suggestions(&ledger, at(2024, 3, 1));
        assert!(!suggestions.enabled);
        assert_eq!(suggestions.items.len(), 1);
    }

    #[test]
    fn test_bulk_restock_suggested() {
        let ledger = ledger_with(
            vec![bear_brand(3), product(2, "Nova", 0), product(3, "Plenty", 40)],
            vec![],
        );
        let planned = bulk_restock_suggested(&ledger, at(2024, 3, 1)).unwrap();
        let BulkRestockOutcome::Restocked(entries) = &planned.outcome else {
            panic!("expected restocks");
        };
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.kind == RestockKind::BulkSuggestion));
        assert!(entries.iter().all(|e| e.quantity_added == 9));

        let mut after = ledger.clone();
        after.apply(planned.changes);
        assert_eq!(after.product(1).unwrap().quantity, 12);
        assert_eq!(after.product(2).unwrap().quantity, 9);
        assert_eq!(after.product(3).unwrap().quantity, 40);
        assert_eq!(after.restock_history().len(), 2);
    }

    #[test]
    fn test_bulk_restock_uniform() {
        let ledger = ledger_with(vec![bear_brand(3), product(2, "Plenty", 40)], vec![]);
        let planned = bulk_restock_uniform(&ledger, 20, at(2024, 3, 1)).unwrap();
        assert_eq!(planned.outcome.restocked_count(), 1);

        assert!(bulk_restock_uniform(&ledger, 0, at(2024, 3, 1)).is_err());
    }

    fn delivery(name: &str, quantity: i64, cost: i64, price: i64) -> SupplierImportRow {
        SupplierImportRow {
            name: name.to_string(),
            quantity,
            original_price: Money::from_cents(cost),
            selling_price: Money::from_cents(price),
            supplier: Some("Puregold Wholesale".to_string()),
        }
    }

    #[test]
    fn test_supplier_import_restocks_and_creates() {
        let ledger = ledger_with(vec![bear_brand(4)], vec![]);
        let rows = vec![
            delivery("bear brand", 12, 1100, 2200),
            delivery("Milo 24g", 30, 800, 1000),
        ];
        let planned = import_supplier_restock(&ledger, rows, at(2024, 3, 1)).unwrap();
        let report = &planned.outcome;

        assert_eq!(report.imported_count(), 2);
        assert_eq!(report.restocked.len(), 1);
        assert_eq!(report.restocked[0].quantity, 16);
        assert_eq!(report.restocked[0].original_price.cents(), 1100);
        assert_eq!(report.restocked[0].selling_price.cents(), 2200);

        assert_eq!(report.created.len(), 1);
        assert_eq!(report.created[0].name, "Milo 24g");
        assert_eq!(report.created[0].quantity, 30);
        assert_eq!(report.created[0].created_date, Some(at(2024, 3, 1)));

        let prices = planned.changes.price_entries();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].reason, PriceChangeReason::CsvImport);
        assert_eq!(prices[0].stock_at_time, 4);
        assert_eq!(prices[0].old_selling_price.cents(), 2000);
        assert_eq!(prices[0].new_selling_price.cents(), 2200);

        let restocked = &report.entries[0];
        assert_eq!(restocked.kind, RestockKind::CsvImport);
        assert_eq!(restocked.notes, "Imported from CSV - Supplier: Puregold Wholesale");
        assert_eq!(restocked.previous_quantity, 4);
        assert_eq!(restocked.stock_after, 16);
        assert_eq!(restocked.total_cost.cents(), 13200);

        let created = &report.entries[1];
        assert_eq!(created.previous_quantity, 0);
        assert_eq!(created.stock_after, 30);
        assert_eq!(created.price_changes, NO_PRICE_CHANGES);
    }

    #[test]
    fn test_supplier_import_skips_incomplete_rows() {
        let ledger = ledger_with(vec![bear_brand(4)], vec![]);
        let mut unnamed_supplier = delivery("Bear Brand", 6, 1000, 2000);
        unnamed_supplier.supplier = None;
        let rows = vec![
            delivery("", 5, 1000, 2000),
            delivery("Nova", 0, 1000, 2000),
            delivery("Chippy", 5, 0, 2000),
            unnamed_supplier,
        ];
        let planned = import_supplier_restock(&ledger, rows, at(2024, 3, 1)).unwrap();
        let report = &planned.outcome;

        assert_eq!(report.skipped, vec!["", "Nova", "Chippy"]);
        assert!(report.created.is_empty());
        // Same prices: stock only, no price history
        assert!(planned.changes.price_entries().is_empty());
        assert_eq!(report.restocked[0].quantity, 10);
        assert_eq!(report.entries[0].notes, "Imported from CSV - Supplier: Unknown Supplier");
    }

    #[test]
    fn test_supplier_import_repeated_name_accumulates() {
        let ledger = Ledger::new();
        let rows = vec![
            delivery("Skyflakes", 10, 700, 900),
            delivery("SKYFLAKES", 5, 700, 950),
        ];
        let planned = import_supplier_restock(&ledger, rows, at(2024, 3, 1)).unwrap();
        let report = &planned.outcome;

        assert_eq!(report.created.len(), 1);
        assert!(report.restocked.is_empty());
        assert_eq!(report.created[0].quantity, 15);
        assert_eq!(report.created[0].selling_price.cents(), 950);
        assert_eq!(report.entries[1].previous_quantity, 10);
        assert_eq!(planned.changes.price_entries()[0].stock_at_time, 10);
    }

    #[test]
    fn test_supplier_import_overflow_fails_whole_import() {
        let ledger = ledger_with(vec![bear_brand(5)], vec![]);
        let rows = vec![
            delivery("Milo 24g", 30, 800, 1000),
            delivery("Bear Brand", i64::MAX, 1000, 2000),
        ];
        assert!(matches!(
            import_supplier_restock(&ledger, rows, at(2024, 3, 1)),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_parse_supplier_csv() {
        let text = "Product Name,Quantity,Original Price,Selling Price,Supplier\n\
                    Widget A,50,5.00,8.50,Supplier ABC\n\
                    \"Widget, Large\", 25 ,10,15.99\n\
                    \n\
                    Broken,lots,abc,1\n";
        let rows = parse_supplier_csv(text).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].name, "Widget A");
        assert_eq!(rows[0].quantity, 50);
        assert_eq!(rows[0].original_price.cents(), 500);
        assert_eq!(rows[0].selling_price.cents(), 850);
        assert_eq!(rows[0].supplier.as_deref(), Some("Supplier ABC"));

        assert_eq!(rows[1].name, "Widget, Large");
        assert_eq!(rows[1].quantity, 25);
        assert_eq!(rows[1].supplier, None);

        // Unreadable numbers become zero and the import skips the row
        assert_eq!(rows[2].quantity, 0);
        assert!(rows[2].original_price.is_zero());
    }

    #[test]
    fn test_bulk_restock_with_nothing_low() {
        let ledger = ledger_with(vec![product(1, "Plenty", 40)], vec![]);
        let planned = bulk_restock_uniform(&ledger, 20, at(2024, 3, 1)).unwrap();
        assert_eq!(planned.outcome, BulkRestockOutcome::NothingToRestock);
        assert!(planned.changes.is_empty());

        let planned = bulk_restock_suggested(&ledger, at(2024, 3, 1)).unwrap();
        assert_eq!(planned.outcome, BulkRestockOutcome::NothingToRestock);
    }
}
