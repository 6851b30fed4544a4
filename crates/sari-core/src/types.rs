//! # Domain Types
//!
//! The five record kinds that make up a store ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌──────────────────────┐  │
//! │  │    Product      │   │      Sale       │   │  PriceHistoryEntry   │  │
//! │  │  ─────────────  │   │  ─────────────  │   │  ──────────────────  │  │
//! │  │  id (ms stamp)  │◄──│  productId      │   │  productId (weak)    │  │
//! │  │  name (unique)  │   │  productName    │   │  old/new prices      │  │
//! │  │  quantity ≥ 0   │   │  unitPrice      │   │  old/new margins     │  │
//! │  │  prices         │   │  originalPrice  │   │  reason              │  │
//! │  └─────────────────┘   └─────────────────┘   └──────────────────────┘  │
//! │                                                                         │
//! │  ┌──────────────────────┐   ┌─────────────────┐                        │
//! │  │ RestockHistoryEntry  │   │    Settings     │                        │
//! │  │  ──────────────────  │   │  ─────────────  │                        │
//! │  │  quantityAdded       │   │  threshold      │                        │
//! │  │  previous / after    │   │  businessName   │                        │
//! │  │  kind, priceChanges  │   │  taxRate        │                        │
//! │  └──────────────────────┘   └─────────────────┘                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Weak References
//! Sales and history entries point at products by id and carry a snapshot
//! of the product name and prices. The product may be deleted later; readers
//! never re-resolve the snapshot.
//!
//! All records serialize with camelCase field names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::compat;
use crate::money::{margin_percent, Money};

/// Product identifier (creation-time millisecond timestamp).
pub type ProductId = i64;

/// Sale identifier.
pub type SaleId = i64;

/// Category assigned when none is given.
pub const DEFAULT_CATEGORY: &str = "Other";

/// Stock level at or below which a product is critical regardless of settings.
pub const CRITICAL_STOCK_LEVEL: i64 = 2;

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

// =============================================================================
// Product
// =============================================================================

/// A product on the shelf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(deserialize_with = "compat::whole_number")]
    pub id: ProductId,

    /// Display name, unique case-insensitively.
    pub name: String,

    #[serde(default = "default_category")]
    pub category: String,

    /// Optional barcode, unique when present.
    #[serde(
        default,
        deserialize_with = "compat::non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub barcode: Option<String>,

    /// Units on hand. Never negative.
    #[serde(deserialize_with = "compat::whole_number")]
    pub quantity: i64,

    /// Unit cost.
    pub original_price: Money,

    /// Unit price.
    pub selling_price: Money,

    /// Units sold over the product's lifetime.
    #[serde(default, deserialize_with = "compat::whole_number")]
    pub total_sold: i64,

    /// Absent on records created before the field existed.
    #[serde(
        default,
        deserialize_with = "compat::optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_date: Option<DateTime<Utc>>,
}

impl Product {
    /// Margin in percent against the selling price.
    pub fn margin_percent(&self) -> f64 {
        margin_percent(self.original_price, self.selling_price)
    }

    /// Case-insensitive name comparison.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }

    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.quantity <= threshold
    }

    pub fn stock_status(&self, threshold: i64) -> StockStatus {
        StockStatus::classify(self.quantity, threshold)
    }
}

// =============================================================================
// Stock Status
// =============================================================================

/// Stock classification used by inventory reports.
///
/// ```text
/// quantity:  0      1..=2      3..=threshold     > threshold
///            │        │              │                 │
///        OutOfStock Critical      LowStock          InStock
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
    OutOfStock,
    Critical,
    LowStock,
    InStock,
}

impl StockStatus {
    pub fn classify(quantity: i64, threshold: i64) -> Self {
        if quantity <= 0 {
            StockStatus::OutOfStock
        } else if quantity <= CRITICAL_STOCK_LEVEL {
            StockStatus::Critical
        } else if quantity <= threshold {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "Out of Stock",
            StockStatus::Critical => "Critical Stock",
            StockStatus::LowStock => "Low Stock",
            StockStatus::InStock => "In Stock",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale. Immutable once created; deletable with stock restitution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    #[serde(deserialize_with = "compat::whole_number")]
    pub id: SaleId,

    #[serde(deserialize_with = "compat::timestamp")]
    pub date: DateTime<Utc>,

    /// Weak reference; the product may no longer exist.
    #[serde(deserialize_with = "compat::whole_number")]
    pub product_id: ProductId,

    pub product_name: String,

    #[serde(deserialize_with = "compat::whole_number")]
    pub quantity: i64,

    pub unit_price: Money,

    /// Unit cost at the time of sale.
    #[serde(default)]
    pub original_price: Money,

    pub total_amount: Money,
}

impl Sale {
    /// Profit from the price snapshots: (unit - cost) × quantity.
    pub fn profit(&self) -> Money {
        (self.unit_price - self.original_price) * self.quantity
    }

    /// Cost of goods sold for this sale.
    pub fn cost(&self) -> Money {
        self.original_price * self.quantity
    }
}

// =============================================================================
// Price History
// =============================================================================

/// Why a price changed.
///
/// Serialized as its display string. Unknown strings from older documents
/// are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PriceChangeReason {
    RestockOriginalPrice,
    RestockSellingPrice,
    BulkUpdate,
    InlineEdit,
    CsvImport,
    Other(String),
}

impl PriceChangeReason {
    pub fn as_str(&self) -> &str {
        match self {
            PriceChangeReason::RestockOriginalPrice => "Restock - Original Price Update",
            PriceChangeReason::RestockSellingPrice => "Restock - Selling Price Update",
            PriceChangeReason::BulkUpdate => "Bulk Price Update",
            PriceChangeReason::InlineEdit => "Inline Edit from Inventory",
            PriceChangeReason::CsvImport => "CSV Import Price Update",
            PriceChangeReason::Other(s) => s,
        }
    }
}

impl From<String> for PriceChangeReason {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Restock - Original Price Update" => PriceChangeReason::RestockOriginalPrice,
            "Restock - Selling Price Update" => PriceChangeReason::RestockSellingPrice,
            "Bulk Price Update" => PriceChangeReason::BulkUpdate,
            "Inline Edit from Inventory" => PriceChangeReason::InlineEdit,
            "CSV Import Price Update" | "CSV Import" => PriceChangeReason::CsvImport,
            _ => PriceChangeReason::Other(value),
        }
    }
}

impl From<PriceChangeReason> for String {
    fn from(reason: PriceChangeReason) -> Self {
        match reason {
            PriceChangeReason::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for PriceChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One price change. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryEntry {
    #[serde(deserialize_with = "compat::whole_number")]
    pub id: i64,

    #[serde(deserialize_with = "compat::timestamp")]
    pub date: DateTime<Utc>,

    #[serde(deserialize_with = "compat::whole_number")]
    pub product_id: ProductId,

    pub product_name: String,

    pub old_original_price: Money,
    pub new_original_price: Money,
    pub old_selling_price: Money,
    pub new_selling_price: Money,

    /// Percent against the old selling price.
    #[serde(default, deserialize_with = "compat::lenient_f64")]
    pub old_margin: f64,

    /// Percent against the new selling price.
    #[serde(default, deserialize_with = "compat::lenient_f64")]
    pub new_margin: f64,

    pub reason: PriceChangeReason,

    /// Stock on hand when the change was made.
    #[serde(default, deserialize_with = "compat::whole_number")]
    pub stock_at_time: i64,
}

impl PriceHistoryEntry {
    /// Builds an entry with both margins derived from the prices.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: i64,
        date: DateTime<Utc>,
        product: &Product,
        old_original_price: Money,
        old_selling_price: Money,
        new_original_price: Money,
        new_selling_price: Money,
        reason: PriceChangeReason,
        stock_at_time: i64,
    ) -> Self {
        Self {
            id,
            date,
            product_id: product.id,
            product_name: product.name.clone(),
            old_original_price,
            new_original_price,
            old_selling_price,
            new_selling_price,
            old_margin: margin_percent(old_original_price, old_selling_price),
            new_margin: margin_percent(new_original_price, new_selling_price),
            reason,
            stock_at_time,
        }
    }
}

// =============================================================================
// Restock History
// =============================================================================

/// Which workflow produced a restock entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RestockKind {
    #[default]
    Manual,
    QuickFromAlert,
    Quick,
    BulkSuggestion,
    BulkUniform,
    CsvImport,
}

impl RestockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestockKind::Manual => "Manual restock",
            RestockKind::QuickFromAlert => "Quick restock from low stock alert",
            RestockKind::Quick => "Quick Restock",
            RestockKind::BulkSuggestion => "Bulk restock - Auto suggestion",
            RestockKind::BulkUniform => "Bulk Restock - Low Stock",
            RestockKind::CsvImport => "Imported from CSV",
        }
    }

    /// Notes recorded when the caller gives none.
    pub fn default_notes(&self) -> &'static str {
        match self {
            RestockKind::Manual => "No notes",
            other => other.as_str(),
        }
    }
}

impl From<String> for RestockKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Quick restock from low stock alert" => RestockKind::QuickFromAlert,
            "Quick Restock" => RestockKind::Quick,
            "Bulk restock - Auto suggestion" => RestockKind::BulkSuggestion,
            "Bulk Restock - Low Stock" => RestockKind::BulkUniform,
            "Imported from CSV" => RestockKind::CsvImport,
            _ => RestockKind::Manual,
        }
    }
}

impl From<RestockKind> for String {
    fn from(kind: RestockKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for RestockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One restock event. Append-only.
///
/// Older documents used two shapes (`stockAfter` + `notes`, or
/// `newQuantity` + `unitCost` + `reason`); both hydrate into this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "LegacyRestockEntry")]
pub struct RestockHistoryEntry {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity_added: i64,
    pub previous_quantity: i64,
    pub stock_after: i64,
    pub price_changes: String,
    pub notes: String,
    pub kind: RestockKind,
    /// Unit cost after the restock.
    pub original_price: Money,
    /// Unit price after the restock.
    pub selling_price: Money,
    pub total_cost: Money,
}

/// Text recorded when a restock did not touch prices.
pub const NO_PRICE_CHANGES: &str = "No price changes";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyRestockEntry {
    #[serde(deserialize_with = "compat::whole_number")]
    id: i64,
    #[serde(deserialize_with = "compat::timestamp")]
    date: DateTime<Utc>,
    #[serde(deserialize_with = "compat::whole_number")]
    product_id: ProductId,
    #[serde(default)]
    product_name: String,
    #[serde(deserialize_with = "compat::whole_number")]
    quantity_added: i64,
    #[serde(default)]
    previous_quantity: Option<serde_json::Value>,
    #[serde(default, alias = "newQuantity")]
    stock_after: Option<serde_json::Value>,
    #[serde(default)]
    price_changes: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default, alias = "reason")]
    kind: Option<String>,
    #[serde(default, alias = "unitCost")]
    original_price: Money,
    #[serde(default)]
    selling_price: Money,
    #[serde(default)]
    total_cost: Option<Money>,
}

fn value_as_i64(value: Option<serde_json::Value>) -> Option<i64> {
    match value? {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl From<LegacyRestockEntry> for RestockHistoryEntry {
    fn from(raw: LegacyRestockEntry) -> Self {
        let kind = raw.kind.map(RestockKind::from).unwrap_or_default();
        let previous = value_as_i64(raw.previous_quantity);
        let after = value_as_i64(raw.stock_after);
        let (previous_quantity, stock_after) = match (previous, after) {
            (Some(p), Some(a)) => (p, a),
            (Some(p), None) => (p, p.saturating_add(raw.quantity_added)),
            (None, Some(a)) => (a.saturating_sub(raw.quantity_added), a),
            (None, None) => (0, raw.quantity_added),
        };
        Self {
            id: raw.id,
            date: raw.date,
            product_id: raw.product_id,
            product_name: raw.product_name,
            quantity_added: raw.quantity_added,
            previous_quantity,
            stock_after,
            price_changes: raw
                .price_changes
                .unwrap_or_else(|| NO_PRICE_CHANGES.to_string()),
            notes: raw
                .notes
                .unwrap_or_else(|| kind.default_notes().to_string()),
            kind,
            original_price: raw.original_price,
            selling_price: raw.selling_price,
            total_cost: raw
                .total_cost
                .unwrap_or(raw.original_price * raw.quantity_added),
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Store-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub low_stock_threshold: i64,
    pub reorder_suggestions: bool,
    pub business_name: String,
    /// Percent, 0..=100.
    pub tax_rate: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            low_stock_threshold: 5,
            reorder_suggestions: true,
            business_name: "My Mini Store".to_string(),
            tax_rate: 0.0,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
