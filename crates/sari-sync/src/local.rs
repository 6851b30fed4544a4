//! # Local Persistence Port
//!
//! The store writes through [`LocalStore`]. [`Database`] is the production
//! implementation; [`MemoryLocalStore`] keeps the collections in memory and
//! can be told to fail.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use sari_core::{Collection, StoreDocument};
use sari_db::{Database, DbError, DbResult, StoreMeta};

/// Durable local storage of the five collections.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Loads every stored collection.
    async fn load(&self) -> DbResult<StoreDocument>;

    /// True when nothing has ever been written.
    async fn is_empty(&self) -> DbResult<bool>;

    /// Writes `collections` of `document` atomically.
    async fn write(
        &self,
        document: &StoreDocument,
        collections: &[Collection],
        now: DateTime<Utc>,
    ) -> DbResult<()>;

    /// Records a successful remote mirror write.
    async fn mark_mirrored(&self, at: DateTime<Utc>) -> DbResult<()>;

    /// Commit and mirror bookkeeping.
    async fn meta(&self) -> DbResult<StoreMeta>;

    /// Records that the stored collections came from the demo ledger.
    async fn mark_demo_seeded(&self) -> DbResult<()>;
}

#[async_trait]
impl LocalStore for Database {
    async fn load(&self) -> DbResult<StoreDocument> {
        self.collections().load().await
    }

    async fn is_empty(&self) -> DbResult<bool> {
        self.collections().is_empty().await
    }

    async fn write(
        &self,
        document: &StoreDocument,
        collections: &[Collection],
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        self.collections()
            .write(document, collections.iter().copied(), now)
            .await
    }

    async fn mark_mirrored(&self, at: DateTime<Utc>) -> DbResult<()> {
        self.collections().mark_mirrored(at).await
    }

    async fn meta(&self) -> DbResult<StoreMeta> {
        self.collections().meta().await
    }

    async fn mark_demo_seeded(&self) -> DbResult<()> {
        self.collections().mark_demo_seeded().await
    }
}

// =============================================================================
// Memory Store
// =============================================================================

#[derive(Debug, Default)]
struct MemoryState {
    document: StoreDocument,
    written: bool,
    last_mirrored: Option<DateTime<Utc>>,
    seeded_from_demo: bool,
}

/// Non-durable local store for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    state: Mutex<MemoryState>,
    failing: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds every collection of `document`.
    pub fn with_document(document: StoreDocument) -> Self {
        let store = Self::new();
        {
            let mut state = store.lock();
            state.document = document;
            state.written = true;
        }
        store
    }

    /// While set, every write fails.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn document(&self) -> StoreDocument {
        self.lock().document.clone()
    }

    pub fn last_mirrored(&self) -> Option<DateTime<Utc>> {
        self.lock().last_mirrored
    }

    pub fn is_demo_seeded(&self) -> bool {
        self.lock().seeded_from_demo
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl LocalStore for MemoryLocalStore {
    async fn load(&self) -> DbResult<StoreDocument> {
        Ok(self.document())
    }

    async fn is_empty(&self) -> DbResult<bool> {
        Ok(!self.lock().written)
    }

    async fn write(
        &self,
        document: &StoreDocument,
        collections: &[Collection],
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DbError::TransactionFailed("disk is read-only".to_string()));
        }

        let mut state = self.lock();
        for collection in collections {
            match collection {
                Collection::Products => state.document.products = document.products.clone(),
                Collection::Sales => state.document.sales = document.sales.clone(),
                Collection::PriceHistory => {
                    state.document.price_history = document.price_history.clone()
                }
                Collection::RestockHistory => {
                    state.document.restock_history = document.restock_history.clone()
                }
                Collection::Settings => state.document.settings = document.settings.clone(),
            }
        }
        state.document.last_updated = Some(now);
        state.written = true;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn mark_mirrored(&self, at: DateTime<Utc>) -> DbResult<()> {
        self.lock().last_mirrored = Some(at);
        Ok(())
    }

    async fn meta(&self) -> DbResult<StoreMeta> {
        let state = self.lock();
        Ok(StoreMeta {
            last_updated: state.document.last_updated,
            last_mirrored_at: state.last_mirrored,
            seeded_from_demo: state.seeded_from_demo,
        })
    }

    async fn mark_demo_seeded(&self) -> DbResult<()> {
        self.lock().seeded_from_demo = true;
        Ok(())
    }
}
