//! # Changesets
//!
//! Every engine operation is planned against a borrowed [`Ledger`] and
//! returns a [`Changeset`] describing what it would change. Nothing is
//! mutated until the caller applies it.
//!
//! ```text
//! ┌──────────────┐  plan   ┌─────────────┐  apply   ┌──────────────┐
//! │ &Ledger      │ ──────► │ Changeset   │ ───────► │ Ledger       │
//! │ + inputs     │         │ + outcome   │          │ (staged)     │
//! │ + now        │         │ + touched() │          │              │
//! └──────────────┘         └─────────────┘          └──────────────┘
//!        │                        │
//!        └── Err(CoreError) ──────┘  nothing planned, nothing changed
//! ```
//!
//! [`Changeset::touched`] tells the persistence layer which collections need
//! to be written.

use std::collections::BTreeSet;

use crate::ledger::{Collection, StoreDocument};
use crate::types::{
    PriceHistoryEntry, Product, ProductId, RestockHistoryEntry, Sale, SaleId, Settings,
};

/// A single product mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductChange {
    /// Insert, or replace the product with the same id.
    Upsert(Product),
    Remove(ProductId),
}

/// The pending effect of one engine operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changeset {
    pub(crate) replacement: Option<Box<StoreDocument>>,
    pub(crate) products: Vec<ProductChange>,
    pub(crate) new_sales: Vec<Sale>,
    pub(crate) removed_sales: Vec<SaleId>,
    pub(crate) price_entries: Vec<PriceHistoryEntry>,
    pub(crate) restock_entries: Vec<RestockHistoryEntry>,
    pub(crate) settings: Option<Settings>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    /// A changeset that replaces all five collections (backup restore).
    pub fn replace_all(document: StoreDocument) -> Self {
        Self {
            replacement: Some(Box::new(document)),
            ..Self::default()
        }
    }

    pub fn upsert_product(&mut self, product: Product) -> &mut Self {
        self.products.push(ProductChange::Upsert(product));
        self
    }

    pub fn remove_product(&mut self, id: ProductId) -> &mut Self {
        self.products.push(ProductChange::Remove(id));
        self
    }

    pub fn add_sale(&mut self, sale: Sale) -> &mut Self {
        self.new_sales.push(sale);
        self
    }

    pub fn remove_sale(&mut self, id: SaleId) -> &mut Self {
        self.removed_sales.push(id);
        self
    }

    pub fn add_price_entry(&mut self, entry: PriceHistoryEntry) -> &mut Self {
        self.price_entries.push(entry);
        self
    }

    pub fn add_restock_entry(&mut self, entry: RestockHistoryEntry) -> &mut Self {
        self.restock_entries.push(entry);
        self
    }

    pub fn set_settings(&mut self, settings: Settings) -> &mut Self {
        self.settings = Some(settings);
        self
    }

    pub fn product_changes(&self) -> &[ProductChange] {
        &self.products
    }

    pub fn price_entries(&self) -> &[PriceHistoryEntry] {
        &self.price_entries
    }

    pub fn restock_entries(&self) -> &[RestockHistoryEntry] {
        &self.restock_entries
    }

    pub fn new_sales(&self) -> &[Sale] {
        &self.new_sales
    }

    pub fn removed_sales(&self) -> &[SaleId] {
        &self.removed_sales
    }

    pub fn is_empty(&self) -> bool {
        self.touched().is_empty()
    }

    /// Collections this changeset writes to.
    pub fn touched(&self) -> BTreeSet<Collection> {
        if self.replacement.is_some() {
            return Collection::ALL.into_iter().collect();
        }

        let mut touched = BTreeSet::new();
        if !self.products.is_empty() {
            touched.insert(Collection::Products);
        }
        if !self.new_sales.is_empty() || !self.removed_sales.is_empty() {
            touched.insert(Collection::Sales);
        }
        if !self.price_entries.is_empty() {
            touched.insert(Collection::PriceHistory);
        }
        if !self.restock_entries.is_empty() {
            touched.insert(Collection::RestockHistory);
        }
        if self.settings.is_some() {
            touched.insert(Collection::Settings);
        }
        touched
    }
}

// =============================================================================
// Planned
// =============================================================================

/// A changeset together with the operation's result.
#[derive(Debug, Clone, PartialEq)]
pub struct Planned<T> {
    pub changes: Changeset,
    pub outcome: T,
}

impl<T> Planned<T> {
    pub fn new(changes: Changeset, outcome: T) -> Self {
        Self { changes, outcome }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Planned<U> {
        Planned {
            changes: self.changes,
            outcome: f(self.outcome),
        }
    }
}
