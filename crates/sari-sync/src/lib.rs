//! # sari-sync: Store Lifecycle & Remote Mirror for Sari
//!
//! This crate owns the live ledger. Every change goes through
//! [`Store::commit`]: it is written to local SQLite first, then made live,
//! then mirrored to a remote document store in the background.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Store Architecture                              │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐   │
//! │  │                      Store (store.rs)                            │   │
//! │  │                                                                  │   │
//! │  │  Ledger (live) ◄── swap after local write succeeds               │   │
//! │  │  Engine ops from sari-core plan a Changeset against &Ledger      │   │
//! │  └──────────────┬──────────────────────────────┬────────────────────┘   │
//! │                 │ await                        │ watch, never waits     │
//! │                 ▼                              ▼                        │
//! │  ┌────────────────────────┐      ┌────────────────────────────────┐     │
//! │  │ LocalStore (local.rs)  │      │ Mirror task (mirror.rs)        │     │
//! │  │                        │◄─────│                                │     │
//! │  │ sari-db Database       │ mark │ 500 ms trailing debounce       │     │
//! │  │ one tx per commit      │ mir- │ backoff retries                │     │
//! │  │                        │ rored│ watch<MirrorStatus>            │     │
//! │  └────────────────────────┘      └───────────────┬────────────────┘     │
//! │                                                  ▼                      │
//! │                                  ┌────────────────────────────────┐     │
//! │                                  │ DocumentStore (remote.rs)      │     │
//! │                                  │ Directory / Memory             │     │
//! │                                  └────────────────────────────────┘     │
//! │                                                                         │
//! │  Config (config.rs): defaults → store.toml → SARI_* env → validate      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`store`] - The `Store`, `Committed` results and notices
//! - [`config`] - Store configuration (tenant, paths, mirror mode)
//! - [`error`] - Store error types
//! - [`local`] - Local persistence port
//! - [`remote`] - Remote document stores
//! - [`mirror`] - Debounced background mirror
//! - [`telemetry`] - Tracing subscriber setup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sari_sync::{Store, StoreConfig};
//! use sari_core::restock::RestockRequest;
//!
//! sari_sync::telemetry::init_tracing();
//! let config = StoreConfig::load_or_default(None);
//! let mut store = Store::open(&config).await?;
//!
//! let restocked = store
//!     .restock(RestockRequest {
//!         product_id,
//!         quantity_added: 8,
//!         ..Default::default()
//!     })
//!     .await?;
//! for notice in &restocked.notices {
//!     println!("{}", notice);
//! }
//!
//! store.shutdown().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod local;
pub mod mirror;
pub mod remote;
pub mod store;
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{RemoteMode, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use local::{LocalStore, MemoryLocalStore};
pub use mirror::{MirrorHandle, MirrorSettings, MirrorStatus};
pub use remote::{DirectoryDocumentStore, DocumentStore, MemoryDocumentStore};
pub use store::{Committed, Notice, Origin, Store, StoreOptions};
