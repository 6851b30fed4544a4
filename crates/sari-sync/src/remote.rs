//! # Remote Document Stores
//!
//! The remote mirror keeps one [`StoreDocument`] per tenant.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       DocumentStore                                     │
//! │                                                                         │
//! │  fetch(tenant) ──► Option<StoreDocument>   (None: never mirrored)      │
//! │  put(tenant, doc)  replaces the whole document                         │
//! │                                                                         │
//! │  DirectoryDocumentStore   <root>/<tenant>.json                         │
//! │                           written to .<tenant>.json.tmp, then renamed  │
//! │                                                                         │
//! │  MemoryDocumentStore      HashMap, failure switch, write counter       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Documents missing a collection hydrate it as empty (settings as
//! defaults), so older documents stay readable.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::debug;

use sari_core::StoreDocument;

use crate::error::{StoreError, StoreResult};

/// A remote store holding one document per tenant.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn fetch(&self, tenant: &str) -> StoreResult<Option<StoreDocument>>;

    async fn put(&self, tenant: &str, document: &StoreDocument) -> StoreResult<()>;
}

// =============================================================================
// Directory Store
// =============================================================================

/// Stores each tenant's document as a JSON file in one directory.
///
/// The directory may be a synced or network-mounted folder.
#[derive(Debug, Clone)]
pub struct DirectoryDocumentStore {
    root: PathBuf,
}

impl DirectoryDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryDocumentStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, tenant: &str) -> PathBuf {
        self.root.join(format!("{}.json", tenant))
    }

    fn staging_path(&self, tenant: &str) -> PathBuf {
        self.root.join(format!(".{}.json.tmp", tenant))
    }
}

#[async_trait]
impl DocumentStore for DirectoryDocumentStore {
    async fn fetch(&self, tenant: &str) -> StoreResult<Option<StoreDocument>> {
        let path = self.document_path(tenant);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(?path, "No remote document yet");
                return Ok(None);
            }
            Err(e) => return Err(StoreError::Remote(format!("{}: {}", path.display(), e))),
        };

        let document = serde_json::from_str(&contents)?;
        Ok(Some(document))
    }

    async fn put(&self, tenant: &str, document: &StoreDocument) -> StoreResult<()> {
        let remote =
            |e: std::io::Error| StoreError::Remote(format!("{}: {}", self.root.display(), e));

        let payload = serde_json::to_vec_pretty(document)?;
        tokio::fs::create_dir_all(&self.root).await.map_err(remote)?;

        let staging = self.staging_path(tenant);
        tokio::fs::write(&staging, &payload).await.map_err(remote)?;
        tokio::fs::rename(&staging, self.document_path(tenant))
            .await
            .map_err(remote)?;

        debug!(tenant = %tenant, bytes = payload.len(), "Remote document written");
        Ok(())
    }
}

// =============================================================================
// Memory Store
// =============================================================================

/// In-process document store for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<HashMap<String, StoreDocument>>,
    failing: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `document` for `tenant`.
    pub fn with_document(tenant: &str, document: StoreDocument) -> Self {
        let store = Self::new();
        store.lock().insert(tenant.to_string(), document);
        store
    }

    /// While set, every fetch and put fails.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful puts.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn document(&self, tenant: &str) -> Option<StoreDocument> {
        self.lock().get(tenant).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoreDocument>> {
        // A poisoned map only means a panicking test; the data is still usable
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Remote("remote store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn fetch(&self, tenant: &str) -> StoreResult<Option<StoreDocument>> {
        self.check()?;
        Ok(self.document(tenant))
    }

    async fn put(&self, tenant: &str, document: &StoreDocument) -> StoreResult<()> {
        self.check()?;
        self.lock().insert(tenant.to_string(), document.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
