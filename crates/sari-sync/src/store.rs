//! # Store
//!
//! Owns the live [`Ledger`] and is the only place changes are committed.
//!
//! ## Commit Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Store::commit                                   │
//! │                                                                         │
//! │  1. engine op (&Ledger) ──► Planned { changes, outcome }               │
//! │         │   validation / not-found errors stop here, nothing staged    │
//! │         ▼                                                               │
//! │  2. staged = ledger.clone(); staged.apply(changes)                     │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  3. LocalStore::write(staged, touched collections)  ONE TRANSACTION    │
//! │         │   failure ──► StoreError::LocalPersistence,                  │
//! │         │               live ledger untouched                           │
//! │         ▼                                                               │
//! │  4. ledger = staged                                                     │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  5. remote not reconciled yet? fetch + hydrate/merge first             │
//! │         │   fetch fails ──► Notice::SavedLocallyOnly, nothing mirrored  │
//! │         ▼                                                               │
//! │  6. mirror.update(document)   never blocks, debounced                  │
//! │         │   mirror unhealthy ──► Notice::SavedLocallyOnly               │
//! │         ▼                                                               │
//! │  Committed { value, notices }                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Startup
//! ```text
//! local load ──► has data ───────────────────────────► Origin::Local
//!     │
//!     └─ empty ──► remote fetch ──► document ──► write locally ──► Origin::Remote
//!                      │
//!                      ├─ failed: advisory, store stays unreconciled
//!                      ├─ none
//!                      ▼
//!                 demo_fallback? ──► yes ──► demo ledger, unsaved ──► Origin::Demo
//!                      │
//!                      └─ no ──► empty ledger ────────────────────► Origin::Empty
//! ```
//!
//! A demo ledger is written in full by the first commit, so the sample
//! products and their sales are persisted together.
//!
//! ## Remote Reconciliation
//! Nothing is pushed to the remote store until its current document has
//! been read once. Until then a push could overwrite data this store has
//! never seen. The store counts as reconciled when:
//! - the remote was fetched during this session, or
//! - the local store has mirrored successfully before.
//!
//! Otherwise every commit and flush retries the fetch first. A non-empty
//! remote document is then merged with local records (remote wins), or
//! replaces the local data outright when that data came from the demo.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use sari_core::demo::demo_ledger;
use sari_core::inventory::{self, ProductInput, ProductUpsert, SettingsInput};
use sari_core::pricing::{self, BulkPriceChange};
use sari_core::reports::{self, BackupSnapshot};
use sari_core::restock::{
    self, BulkRestockOutcome, QuickRestockSource, ReorderSuggestions, RestockOutcome,
    RestockRequest, SupplierImportReport, SupplierImportRow,
};
use sari_core::sales::{self, SaleDeletionPreview};
use sari_core::{
    Changeset, Collection, Ledger, Money, Planned, Product, ProductId, Sale, SaleId, Settings,
};
use sari_db::{Database, DbConfig};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::local::LocalStore;
use crate::mirror::{Mirror, MirrorHandle, MirrorSettings, MirrorStatus};
use crate::remote::{DirectoryDocumentStore, DocumentStore};

// =============================================================================
// Results
// =============================================================================

/// Advisory attached to a successful operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The change is durable locally, but the remote mirror is failing.
    SavedLocallyOnly { reason: String },
    /// Reorder suggestions are turned off in settings; the operation ran
    /// anyway.
    ReorderSuggestionsDisabled,
    /// The remote store became reachable and its data replaced the demo
    /// ledger, including changes made to it.
    DemoReplacedByRemote,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::SavedLocallyOnly { reason } => write!(f, "Saved locally only: {}", reason),
            Notice::ReorderSuggestionsDisabled => {
                write!(f, "Reorder suggestions are disabled in settings")
            }
            Notice::DemoReplacedByRemote => {
                write!(f, "Stored data was loaded; demo data has been discarded")
            }
        }
    }
}

/// A successful mutation and its advisories.
#[derive(Debug, Clone, PartialEq)]
pub struct Committed<T> {
    pub value: T,
    pub notices: Vec<Notice>,
}

impl<T> Committed<T> {
    pub fn new(value: T) -> Self {
        Committed {
            value,
            notices: Vec::new(),
        }
    }

    pub fn is_saved_locally_only(&self) -> bool {
        self.notices
            .iter()
            .any(|n| matches!(n, Notice::SavedLocallyOnly { .. }))
    }

    pub fn has_notice(&self, notice: &Notice) -> bool {
        self.notices.contains(notice)
    }
}

/// Where the ledger came from at startup.
///
/// Becomes [`Origin::Remote`] when a late reconciliation replaces an empty
/// or demo ledger with the remote document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Local,
    Remote,
    Demo,
    Empty,
}

/// What a successful remote fetch did to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reconciled {
    /// Remote had nothing; local data stands.
    Unchanged,
    /// Remote document loaded into an empty ledger.
    Hydrated,
    /// Remote document replaced demo data.
    DemoReplaced,
    /// Remote and local records combined.
    Merged,
}

// =============================================================================
// Options
// =============================================================================

/// Store behavior independent of how the ports were built.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub tenant_id: String,
    pub mirror: MirrorSettings,
    pub demo_fallback: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            tenant_id: "default".to_string(),
            mirror: MirrorSettings::default(),
            demo_fallback: true,
        }
    }
}

impl From<&StoreConfig> for StoreOptions {
    fn from(config: &StoreConfig) -> Self {
        StoreOptions {
            tenant_id: config.tenant_id().to_string(),
            mirror: MirrorSettings::with_debounce(config.debounce()),
            demo_fallback: config.startup.demo_fallback,
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// The live store.
///
/// Mutations take `&mut self`, so two of them never interleave.
pub struct Store {
    ledger: Ledger,
    local: Arc<dyn LocalStore>,
    remote: Option<Arc<dyn DocumentStore>>,
    mirror: Option<MirrorHandle>,
    tenant_id: String,
    origin: Origin,
    /// The ledger has never been written locally (demo data).
    unsaved: bool,
    /// The ledger started from the demo, in memory or on disk.
    demo_seeded: bool,
    /// The remote document has been read, so pushing cannot lose data.
    reconciled: bool,
    last_updated: Option<DateTime<Utc>>,
    startup_notices: Vec<Notice>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("origin", &self.origin)
            .field("products", &self.ledger.products().len())
            .field("sales", &self.ledger.sales().len())
            .field("mirror", &self.mirror.is_some())
            .field("reconciled", &self.reconciled)
            .finish()
    }
}

impl Store {
    /// Opens the store described by `config`.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = StoreConfig::load(None)?;
    /// let mut store = Store::open(&config).await?;
    /// let sale = store.record_sale(product_id, 2).await?;
    /// ```
    pub async fn open(config: &StoreConfig) -> StoreResult<Self> {
        config.validate()?;

        let db = Database::new(
            DbConfig::new(config.database_path()).max_connections(config.local.max_connections),
        )
        .await?;

        let remote: Option<Arc<dyn DocumentStore>> = match config.remote_directory() {
            Some(dir) if config.is_mirror_enabled() => {
                Some(Arc::new(DirectoryDocumentStore::new(dir)))
            }
            _ => None,
        };

        Self::open_with(Arc::new(db), remote, StoreOptions::from(config)).await
    }

    /// Opens a store over the given ports.
    pub async fn open_with(
        local: Arc<dyn LocalStore>,
        remote: Option<Arc<dyn DocumentStore>>,
        options: StoreOptions,
    ) -> StoreResult<Self> {
        let document = local.load().await?;
        let meta = local.meta().await?;
        let has_local = !document.is_empty() || !local.is_empty().await?;

        let mirror = remote.clone().map(|remote| {
            Mirror::new(
                remote,
                local.clone(),
                options.tenant_id.clone(),
                options.mirror.clone(),
            )
            .start()
        });

        let mut store = Store {
            ledger: Ledger::new(),
            local,
            reconciled: remote.is_none() || (has_local && meta.last_mirrored_at.is_some()),
            remote,
            mirror,
            tenant_id: options.tenant_id.clone(),
            origin: Origin::Empty,
            unsaved: false,
            demo_seeded: has_local && meta.seeded_from_demo,
            last_updated: document.last_updated,
            startup_notices: Vec::new(),
        };

        if has_local {
            store.ledger = Ledger::from_document(document);
            store.origin = Origin::Local;
        }

        if let Err(e) = store.reconcile_remote().await {
            if !e.is_remote() {
                return Err(e);
            }
            warn!(
                tenant = %store.tenant_id,
                error = %e,
                "Remote fetch failed; nothing is mirrored until it succeeds"
            );
            store.startup_notices.push(Notice::SavedLocallyOnly {
                reason: e.to_string(),
            });
        }

        if store.origin == Origin::Empty && options.demo_fallback {
            warn!("No stored data found; serving demo data until the first change");
            store.ledger = demo_ledger(Utc::now());
            store.origin = Origin::Demo;
            store.unsaved = true;
            store.demo_seeded = true;
        }

        info!(
            origin = ?store.origin,
            products = store.ledger.products().len(),
            sales = store.ledger.sales().len(),
            mirror = store.mirror.is_some(),
            reconciled = store.reconciled,
            "Store opened"
        );

        Ok(store)
    }

    /// Reads the remote document once before anything is pushed to it.
    ///
    /// A no-op once reconciled. Remote errors leave the store unreconciled.
    async fn reconcile_remote(&mut self) -> StoreResult<Reconciled> {
        if self.reconciled {
            return Ok(Reconciled::Unchanged);
        }
        let Some(remote) = self.remote.clone() else {
            self.reconciled = true;
            return Ok(Reconciled::Unchanged);
        };

        let fetched = remote.fetch(&self.tenant_id).await.map_err(|e| {
            if e.is_remote() {
                e
            } else {
                StoreError::Remote(e.to_string())
            }
        })?;
        let now = Utc::now();

        let outcome = match fetched {
            Some(remote_document) if !remote_document.is_empty() => {
                let (document, outcome) = if self.ledger.is_empty() {
                    (remote_document, Reconciled::Hydrated)
                } else if self.demo_seeded {
                    (remote_document, Reconciled::DemoReplaced)
                } else {
                    let local_document = self.ledger.to_document(self.last_updated);
                    (remote_document.merge_local(local_document), Reconciled::Merged)
                };

                self.local.write(&document, &Collection::ALL, now).await?;
                if outcome != Reconciled::Merged {
                    // Local now holds exactly the remote document
                    if let Err(e) = self.local.mark_mirrored(now).await {
                        warn!(error = %e, "Failed to record mirror time locally");
                    }
                }

                info!(
                    tenant = %self.tenant_id,
                    outcome = ?outcome,
                    products = document.products.len(),
                    sales = document.sales.len(),
                    "Reconciled with remote document"
                );
                self.ledger = Ledger::from_document(document);
                self.last_updated = Some(now);
                self.unsaved = false;
                if outcome != Reconciled::Merged {
                    self.origin = Origin::Remote;
                    self.demo_seeded = false;
                }
                outcome
            }
            _ => {
                debug!(tenant = %self.tenant_id, "No remote document to reconcile with");
                Reconciled::Unchanged
            }
        };

        self.reconciled = true;

        // Records made while the remote was unread still have to reach it
        let local_only = matches!(outcome, Reconciled::Unchanged | Reconciled::Merged);
        if local_only && !self.unsaved && !self.ledger.is_empty() {
            if let Some(mirror) = &self.mirror {
                if let Err(e) = mirror.update(self.ledger.to_document(self.last_updated)) {
                    warn!(error = %e, "Remote mirror unavailable");
                }
            }
        }
        Ok(outcome)
    }

    // =========================================================================
    // Read Access
    // =========================================================================

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Advisories raised while opening, such as an unreachable remote.
    pub fn startup_notices(&self) -> &[Notice] {
        &self.startup_notices
    }

    /// Time of the last local commit.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// `None` when the store runs without a remote mirror.
    pub fn mirror_status(&self) -> Option<MirrorStatus> {
        self.mirror.as_ref().map(MirrorHandle::status)
    }

    pub fn reorder_suggestions(&self) -> ReorderSuggestions {
        restock::reorder_suggestions(&self.ledger, Utc::now())
    }

    pub fn preview_sale_deletion(&self, sale_id: SaleId) -> StoreResult<SaleDeletionPreview> {
        Ok(sales::preview_sale_deletion(&self.ledger, sale_id)?)
    }

    pub fn backup_snapshot(&self) -> BackupSnapshot {
        reports::backup_snapshot(&self.ledger, Utc::now())
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Persists a planned change and makes it live.
    pub async fn commit<T>(&mut self, planned: Planned<T>) -> StoreResult<Committed<T>> {
        let Planned { changes, outcome } = planned;
        if changes.is_empty() {
            return Ok(Committed::new(outcome));
        }

        let touched: Vec<Collection> = if self.unsaved {
            Collection::ALL.to_vec()
        } else {
            changes.touched().into_iter().collect()
        };

        let now = Utc::now();
        let mut staged = self.ledger.clone();
        staged.apply(changes);
        let document = staged.to_document(Some(now));

        self.local.write(&document, &touched, now).await?;
        if self.unsaved && self.demo_seeded {
            if let Err(e) = self.local.mark_demo_seeded().await {
                warn!(error = %e, "Failed to record demo provenance locally");
            }
        }

        self.ledger = staged;
        self.last_updated = Some(now);
        self.unsaved = false;
        debug!(collections = ?touched, "Committed");

        let mut committed = Committed::new(outcome);
        if self.mirror.is_none() {
            return Ok(committed);
        }

        let document = match self.reconcile_remote().await {
            Ok(Reconciled::Unchanged) => document,
            Ok(Reconciled::Merged) => self.ledger.to_document(self.last_updated),
            Ok(reconciled) => {
                // Local data is now the remote document itself
                if reconciled == Reconciled::DemoReplaced {
                    committed.notices.push(Notice::DemoReplacedByRemote);
                }
                return Ok(committed);
            }
            Err(e) => {
                // The change itself is already durable; reconciliation retries next commit
                warn!(error = %e, "Remote not reconciled; change saved locally only");
                committed.notices.push(Notice::SavedLocallyOnly {
                    reason: e.to_string(),
                });
                return Ok(committed);
            }
        };

        if let Some(mirror) = &self.mirror {
            if let Some(reason) = mirror.status().last_error {
                committed.notices.push(Notice::SavedLocallyOnly { reason });
            }
            if let Err(e) = mirror.update(document) {
                warn!(error = %e, "Remote mirror unavailable");
                if !committed.is_saved_locally_only() {
                    committed.notices.push(Notice::SavedLocallyOnly {
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(committed)
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    pub async fn create_or_update_product(
        &mut self,
        input: ProductInput,
    ) -> StoreResult<Committed<ProductUpsert>> {
        let planned = inventory::create_or_update_product(&self.ledger, input, Utc::now())?;
        self.commit(planned).await
    }

    pub async fn delete_product(
        &mut self,
        product_id: ProductId,
    ) -> StoreResult<Committed<Product>> {
        let planned = inventory::delete_product(&self.ledger, product_id)?;
        self.commit(planned).await
    }

    pub async fn update_product_inline(
        &mut self,
        product_id: ProductId,
        quantity: i64,
        original_price: Money,
        selling_price: Money,
    ) -> StoreResult<Committed<Product>> {
        let planned = inventory::update_product_inline(
            &self.ledger,
            product_id,
            quantity,
            original_price,
            selling_price,
            Utc::now(),
        )?;
        self.commit(planned).await
    }

    pub async fn update_settings(
        &mut self,
        input: SettingsInput,
    ) -> StoreResult<Committed<Settings>> {
        let planned = inventory::update_settings(input)?;
        self.commit(planned).await
    }

    // =========================================================================
    // Sales
    // =========================================================================

    pub async fn record_sale(
        &mut self,
        product_id: ProductId,
        quantity: i64,
    ) -> StoreResult<Committed<Sale>> {
        let planned = sales::record_sale(&self.ledger, product_id, quantity, Utc::now())?;
        self.commit(planned).await
    }

    pub async fn delete_sale(
        &mut self,
        sale_id: SaleId,
    ) -> StoreResult<Committed<SaleDeletionPreview>> {
        let planned = sales::delete_sale(&self.ledger, sale_id)?;
        self.commit(planned).await
    }

    // =========================================================================
    // Restock
    // =========================================================================

    pub async fn restock(
        &mut self,
        request: RestockRequest,
    ) -> StoreResult<Committed<RestockOutcome>> {
        let planned = restock::restock(&self.ledger, request, Utc::now())?;
        self.commit(planned).await
    }

    pub async fn quick_restock(
        &mut self,
        product_id: ProductId,
        quantity_added: i64,
        source: QuickRestockSource,
    ) -> StoreResult<Committed<RestockOutcome>> {
        let planned =
            restock::quick_restock(&self.ledger, product_id, quantity_added, source, Utc::now())?;
        self.commit(planned).await
    }

    /// Restocks every low-stock product by its suggestion.
    ///
    /// Runs even when suggestions are disabled in settings, with a notice.
    pub async fn bulk_restock_suggested(&mut self) -> StoreResult<Committed<BulkRestockOutcome>> {
        let enabled = self.ledger.settings().reorder_suggestions;
        let planned = restock::bulk_restock_suggested(&self.ledger, Utc::now())?;
        let mut committed = self.commit(planned).await?;
        if !enabled {
            committed.notices.push(Notice::ReorderSuggestionsDisabled);
        }
        Ok(committed)
    }

    pub async fn bulk_restock_uniform(
        &mut self,
        amount: i64,
    ) -> StoreResult<Committed<BulkRestockOutcome>> {
        let planned = restock::bulk_restock_uniform(&self.ledger, amount, Utc::now())?;
        self.commit(planned).await
    }

    /// Receives a supplier delivery: restocks matching products, creates
    /// the rest, and records one restock entry per imported row.
    pub async fn import_supplier_restock(
        &mut self,
        rows: Vec<SupplierImportRow>,
    ) -> StoreResult<Committed<SupplierImportReport>> {
        let planned = restock::import_supplier_restock(&self.ledger, rows, Utc::now())?;
        info!(
            created = planned.outcome.created.len(),
            restocked = planned.outcome.restocked.len(),
            skipped = planned.outcome.skipped.len(),
            "Importing supplier delivery"
        );
        self.commit(planned).await
    }

    /// Parses a supplier sheet and imports it in one commit.
    pub async fn import_supplier_csv(
        &mut self,
        text: &str,
    ) -> StoreResult<Committed<SupplierImportReport>> {
        let rows = restock::parse_supplier_csv(text)?;
        self.import_supplier_restock(rows).await
    }

    // =========================================================================
    // Pricing
    // =========================================================================

    pub async fn apply_bulk_price_changes(
        &mut self,
        changes: &[BulkPriceChange],
    ) -> StoreResult<Committed<Vec<Product>>> {
        let planned = pricing::apply_bulk_price_changes(&self.ledger, changes, Utc::now())?;
        self.commit(planned).await
    }

    // =========================================================================
    // Backup
    // =========================================================================

    /// Replaces all five collections with a backup in one commit.
    pub async fn restore(&mut self, snapshot: BackupSnapshot) -> StoreResult<Committed<()>> {
        let document = snapshot.into_document();
        info!(
            products = document.products.len(),
            sales = document.sales.len(),
            "Restoring backup"
        );
        self.commit(Planned::new(Changeset::replace_all(document), ()))
            .await
    }

    // =========================================================================
    // Mirror Control
    // =========================================================================

    /// Writes the newest committed document to the remote store now.
    ///
    /// Reconciles with the remote document first if that has not happened
    /// yet. A no-op without a mirror.
    pub async fn flush_mirror(&mut self) -> StoreResult<()> {
        if self.mirror.is_none() {
            return Ok(());
        }
        self.reconcile_remote().await?;
        match &self.mirror {
            Some(mirror) => mirror.flush().await,
            None => Ok(()),
        }
    }

    /// True once the remote document has been read (or there is none to
    /// read), so mirroring cannot overwrite unseen data.
    pub fn is_reconciled(&self) -> bool {
        self.reconciled
    }

    /// Flushes the mirror and stops it. Local data is unaffected.
    pub async fn shutdown(mut self) -> StoreResult<()> {
        if let Some(mirror) = self.mirror.take() {
            mirror.shutdown().await?;
        }
        info!("Store closed");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
