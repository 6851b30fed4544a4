//! # sari-db: Local Persistence for Sari
//!
//! This crate keeps a store's collections in a local SQLite database using
//! sqlx. It knows nothing about business rules: it stores and returns
//! [`StoreDocument`](sari_core::StoreDocument) collections.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Sari Data Flow                                 │
//! │                                                                         │
//! │  Store::commit (sari-sync)                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     sari-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌──────────────────┐  ┌──────────────┐ │   │
//! │  │   │   Database    │    │   Repository     │  │  Migrations  │ │   │
//! │  │   │   (pool.rs)   │◄───│ (collections.rs) │  │  (embedded)  │ │   │
//! │  │   │  SqlitePool   │    │ load / write     │  │ 001_colls... │ │   │
//! │  │   └───────────────┘    └──────────────────┘  └──────────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   collections(key, payload, updated_at) + store_meta            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Collection storage
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sari_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/sari.db")).await?;
//! let document = db.collections().load().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::collections::{CollectionRepository, StoreMeta};
