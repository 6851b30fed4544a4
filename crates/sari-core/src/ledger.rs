//! # Ledger
//!
//! The in-memory state of one store: five collections that must stay
//! mutually consistent.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              Ledger                                     │
//! │                                                                         │
//! │   products ◄──────── sales.productId          (weak, snapshot names)   │
//! │      ▲                                                                  │
//! │      ├────────────── priceHistory.productId   (append-only)            │
//! │      └────────────── restockHistory.productId (append-only)            │
//! │                                                                         │
//! │   settings          (threshold, reorder flag, business name, tax)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The ledger is read through `&Ledger` and changed only by
//! [`Ledger::apply`], which is infallible. All validation happens while the
//! [`Changeset`] is planned.
//!
//! [`StoreDocument`] is the serialized form shared by local persistence,
//! the remote mirror and backups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::changeset::{Changeset, ProductChange};
use crate::error::{CoreError, CoreResult};
use crate::types::{
    PriceHistoryEntry, Product, ProductId, RestockHistoryEntry, Sale, SaleId, Settings,
};

// =============================================================================
// Collections
// =============================================================================

/// One of the five persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    Products,
    Sales,
    PriceHistory,
    RestockHistory,
    Settings,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Products,
        Collection::Sales,
        Collection::PriceHistory,
        Collection::RestockHistory,
        Collection::Settings,
    ];

    /// Storage key, identical to the document field name.
    pub fn key(&self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Sales => "sales",
            Collection::PriceHistory => "priceHistory",
            Collection::RestockHistory => "restockHistory",
            Collection::Settings => "settings",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Collection::ALL.into_iter().find(|c| c.key() == key)
    }
}

// =============================================================================
// Store Document
// =============================================================================

/// The full persisted bundle. Absent fields hydrate as empty collections
/// and default settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreDocument {
    pub products: Vec<Product>,
    pub sales: Vec<Sale>,
    pub price_history: Vec<PriceHistoryEntry>,
    pub restock_history: Vec<RestockHistoryEntry>,
    pub settings: Settings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl StoreDocument {
    /// True when no records exist. Settings alone do not count.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
            && self.sales.is_empty()
            && self.price_history.is_empty()
            && self.restock_history.is_empty()
    }

    /// Serializes one collection to its JSON payload.
    pub fn encode_collection(&self, collection: Collection) -> serde_json::Result<String> {
        match collection {
            Collection::Products => serde_json::to_string(&self.products),
            Collection::Sales => serde_json::to_string(&self.sales),
            Collection::PriceHistory => serde_json::to_string(&self.price_history),
            Collection::RestockHistory => serde_json::to_string(&self.restock_history),
            Collection::Settings => serde_json::to_string(&self.settings),
        }
    }

    /// Replaces one collection from its JSON payload.
    pub fn decode_collection(
        &mut self,
        collection: Collection,
        payload: &str,
    ) -> serde_json::Result<()> {
        match collection {
            Collection::Products => self.products = serde_json::from_str(payload)?,
            Collection::Sales => self.sales = serde_json::from_str(payload)?,
            Collection::PriceHistory => self.price_history = serde_json::from_str(payload)?,
            Collection::RestockHistory => self.restock_history = serde_json::from_str(payload)?,
            Collection::Settings => self.settings = serde_json::from_str(payload)?,
        }
        Ok(())
    }

    /// Folds records made locally into this (remote) document.
    ///
    /// The remote side wins: its settings are kept, and a local product is
    /// dropped when its id or name already exists remotely. History and
    /// sales entries are unioned by id and kept in date order.
    pub fn merge_local(mut self, local: StoreDocument) -> StoreDocument {
        for product in local.products {
            let known = self.products.iter().any(|p| {
                p.id == product.id || p.name.trim().eq_ignore_ascii_case(product.name.trim())
            });
            if !known {
                self.products.push(product);
            }
        }

        union_by_id(&mut self.sales, local.sales, |s| s.id, |s| s.date);
        union_by_id(&mut self.price_history, local.price_history, |e| e.id, |e| e.date);
        union_by_id(&mut self.restock_history, local.restock_history, |e| e.id, |e| e.date);

        self.last_updated = self.last_updated.max(local.last_updated);
        self
    }
}

fn union_by_id<T>(
    target: &mut Vec<T>,
    extra: Vec<T>,
    id: impl Fn(&T) -> i64,
    date: impl Fn(&T) -> DateTime<Utc>,
) {
    let before = target.len();
    for item in extra {
        if !target.iter().any(|t| id(t) == id(&item)) {
            target.push(item);
        }
    }
    if target.len() != before {
        target.sort_by_key(|t| date(t));
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// The live store state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    products: Vec<Product>,
    sales: Vec<Sale>,
    price_history: Vec<PriceHistoryEntry>,
    restock_history: Vec<RestockHistoryEntry>,
    settings: Settings,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(document: StoreDocument) -> Self {
        Self {
            products: document.products,
            sales: document.sales,
            price_history: document.price_history,
            restock_history: document.restock_history,
            settings: document.settings,
        }
    }

    pub fn to_document(&self, last_updated: Option<DateTime<Utc>>) -> StoreDocument {
        StoreDocument {
            products: self.products.clone(),
            sales: self.sales.clone(),
            price_history: self.price_history.clone(),
            restock_history: self.restock_history.clone(),
            settings: self.settings.clone(),
            last_updated,
        }
    }

    // ===== Accessors =====

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn sales(&self) -> &[Sale] {
        &self.sales
    }

    pub fn price_history(&self) -> &[PriceHistoryEntry] {
        &self.price_history
    }

    pub fn restock_history(&self) -> &[RestockHistoryEntry] {
        &self.restock_history
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn low_stock_threshold(&self) -> i64 {
        self.settings.low_stock_threshold
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
            && self.sales.is_empty()
            && self.price_history.is_empty()
            && self.restock_history.is_empty()
    }

    // ===== Lookups =====

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Like [`Ledger::product`] but reports a missing product as an error.
    pub fn require_product(&self, id: ProductId) -> CoreResult<&Product> {
        self.product(id).ok_or(CoreError::ProductNotFound(id))
    }

    /// Case-insensitive name lookup.
    pub fn product_by_name(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.has_name(name))
    }

    pub fn product_by_barcode(&self, barcode: &str) -> Option<&Product> {
        self.products
            .iter()
            .find(|p| p.barcode.as_deref() == Some(barcode))
    }

    pub fn sale(&self, id: SaleId) -> Option<&Sale> {
        self.sales.iter().find(|s| s.id == id)
    }

    pub fn require_sale(&self, id: SaleId) -> CoreResult<&Sale> {
        self.sale(id).ok_or(CoreError::SaleNotFound(id))
    }

    /// Sales that reference `product_id`.
    pub fn sales_for(&self, product_id: ProductId) -> impl Iterator<Item = &Sale> + '_ {
        self.sales.iter().filter(move |s| s.product_id == product_id)
    }

    /// A fresh id allocator for changes planned at `now`.
    pub fn id_allocator(&self, now: DateTime<Utc>) -> IdAllocator {
        let max_existing = self
            .products
            .iter()
            .map(|p| p.id)
            .chain(self.sales.iter().map(|s| s.id))
            .chain(self.price_history.iter().map(|e| e.id))
            .chain(self.restock_history.iter().map(|e| e.id))
            .max()
            .unwrap_or(0);
        IdAllocator::new(max_existing, now)
    }

    // ===== Mutation =====

    /// Applies a planned changeset. Infallible.
    pub fn apply(&mut self, changes: Changeset) {
        if let Some(document) = changes.replacement {
            *self = Ledger::from_document(*document);
        }

        for change in changes.products {
            match change {
                ProductChange::Upsert(product) => {
                    match self.products.iter_mut().find(|p| p.id == product.id) {
                        Some(existing) => *existing = product,
                        None => self.products.push(product),
                    }
                }
                ProductChange::Remove(id) => self.products.retain(|p| p.id != id),
            }
        }

        if !changes.removed_sales.is_empty() {
            self.sales.retain(|s| !changes.removed_sales.contains(&s.id));
        }
        self.sales.extend(changes.new_sales);
        self.price_history.extend(changes.price_entries);
        self.restock_history.extend(changes.restock_entries);

        if let Some(settings) = changes.settings {
            self.settings = settings;
        }
    }
}

impl From<StoreDocument> for Ledger {
    fn from(document: StoreDocument) -> Self {
        Ledger::from_document(document)
    }
}

// =============================================================================
// Id Allocation
// =============================================================================

/// Hands out millisecond-timestamp ids that never collide with existing ones.
///
/// ```text
/// now = 1000 ms, largest existing id = 1000
///   next() → 1001, next() → 1002, ...
/// now = 5000 ms, largest existing id = 1002
///   next() → 5000, next() → 5001, ...
/// ```
#[derive(Debug, Clone)]
pub struct IdAllocator {
    last: i64,
}

impl IdAllocator {
    pub fn new(max_existing: i64, now: DateTime<Utc>) -> Self {
        Self {
            last: max_existing.max(now.timestamp_millis() - 1),
        }
    }

    pub fn next_id(&mut self) -> i64 {
        self.last += 1;
        self.last
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
