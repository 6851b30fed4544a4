//! # sari-core: Pure Domain Logic for Sari
//!
//! Inventory, sales, restocking, pricing and reporting for a single small
//! store, as pure functions over an in-memory [`Ledger`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Sari Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Embedding application (UI, exports)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              sari-sync::Store (commit, mirror, config)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ &Ledger in, Changeset out              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ sari-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ inventory │  │   sales   │  │  restock  │  │  reports  │  │   │
//! │  │   │  pricing  │  │           │  │           │  │           │  │   │
//! │  │   └─────┬─────┘  └─────┬─────┘  └─────┬─────┘  └───────────┘  │   │
//! │  │         └──────────────┴──── Changeset ┴──► Ledger::apply      │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 sari-db (SQLite collections)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Records (Product, Sale, history entries, Settings)
//! - [`money`] - Integer centavo amounts
//! - [`ledger`] - The five collections and the persisted [`StoreDocument`]
//! - [`changeset`] - Planned mutations
//! - [`inventory`], [`sales`], [`restock`], [`pricing`] - Operations
//! - [`reports`] - Derived views and exports
//! - [`demo`] - Sample data for offline use
//!
//! ## Example Usage
//!
//! ```rust
//! use sari_core::inventory::{create_or_update_product, ProductInput};
//! use sari_core::sales::record_sale;
//! use sari_core::{Ledger, Money};
//!
//! let now = chrono::Utc::now();
//! let mut ledger = Ledger::new();
//!
//! let planned = create_or_update_product(
//!     &ledger,
//!     ProductInput {
//!         name: "Bear Brand".to_string(),
//!         category: None,
//!         barcode: None,
//!         quantity: 10,
//!         original_price: Money::from_cents(4000),
//!         selling_price: Money::from_cents(5000),
//!     },
//!     now,
//! )?;
//! let id = planned.outcome.product().id;
//! ledger.apply(planned.changes);
//!
//! let planned = record_sale(&ledger, id, 3, now)?;
//! assert_eq!(planned.outcome.total_amount.cents(), 15000);
//! ledger.apply(planned.changes);
//!
//! assert_eq!(ledger.product(id).map(|p| p.quantity), Some(7));
//! # Ok::<(), sari_core::CoreError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod changeset;
pub mod compat;
pub mod demo;
pub mod error;
pub mod inventory;
pub mod ledger;
pub mod money;
pub mod pricing;
pub mod reports;
pub mod restock;
pub mod sales;
pub mod types;
pub mod validation;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use changeset::{Changeset, Planned};
pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{Collection, Ledger, StoreDocument};
pub use money::Money;
pub use types::*;
