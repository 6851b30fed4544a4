//! # Repository Module
//!
//! Database repository implementations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sari-sync::Store                                                       │
//! │       │                                                                 │
//! │       │  db.collections().write(&document, touched, now)                │
//! │       ▼                                                                 │
//! │  CollectionRepository                                                   │
//! │  ├── load(&self)                                                        │
//! │  ├── write(&self, document, collections, now)                           │
//! │  ├── meta(&self)                                                        │
//! │  └── mark_mirrored(&self, at)                                           │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CollectionRepository`](collections::CollectionRepository) - Collection payloads and store
//!   metadata

pub mod collections;
