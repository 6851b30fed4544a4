//! # Collection Repository
//!
//! Stores each of the five collections as one JSON payload row.
//!
//! ## Commit Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   SINGLE TRANSACTION                                    │
//! │                                                                         │
//! │  for each touched collection:                                           │
//! │     INSERT INTO collections (key, payload, updated_at)                  │
//! │     ON CONFLICT(key) DO UPDATE ...                                      │
//! │                                                                         │
//! │  UPDATE store_meta SET last_updated = ?                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//!        │
//!        ▼
//! COMMIT ← all touched collections land together or none do
//! ```
//!
//! Payloads are encoded before the transaction starts, so a serialization
//! failure never opens one.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use sari_core::{Collection, StoreDocument};

/// Store-level bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreMeta {
    /// Time of the last local commit.
    pub last_updated: Option<DateTime<Utc>>,
    /// Time of the last successful remote mirror write.
    pub last_mirrored_at: Option<DateTime<Utc>>,
    /// The stored collections started from the demo ledger.
    pub seeded_from_demo: bool,
}

/// Repository for collection payloads.
#[derive(Debug, Clone)]
pub struct CollectionRepository {
    pool: SqlitePool,
}

impl CollectionRepository {
    /// Creates a new CollectionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CollectionRepository { pool }
    }

    /// Loads every stored collection into a document.
    ///
    /// Missing collections hydrate as empty (settings as defaults). Rows
    /// with an unknown key are skipped.
    pub async fn load(&self) -> DbResult<StoreDocument> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, payload FROM collections")
            .fetch_all(&self.pool)
            .await?;

        let mut document = StoreDocument::default();
        for (key, payload) in rows {
            let Some(collection) = Collection::from_key(&key) else {
                warn!(key = %key, "Skipping unknown collection row");
                continue;
            };
            document
                .decode_collection(collection, &payload)
                .map_err(|e| DbError::invalid_payload(key.as_str(), e))?;
        }
        document.last_updated = self.meta().await?.last_updated;

        debug!(
            products = document.products.len(),
            sales = document.sales.len(),
            "Loaded collections"
        );
        Ok(document)
    }

    /// True when no collection has ever been written.
    pub async fn is_empty(&self) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM collections")
            .fetch_one(&self.pool)
            .await?;
        Ok(count == 0)
    }

    /// Writes the given collections of `document` in one transaction.
    pub async fn write<I>(
        &self,
        document: &StoreDocument,
        collections: I,
        now: DateTime<Utc>,
    ) -> DbResult<()>
    where
        I: IntoIterator<Item = Collection>,
    {
        let mut payloads = Vec::new();
        for collection in collections {
            let payload = document
                .encode_collection(collection)
                .map_err(|e| DbError::invalid_payload(collection.key(), e))?;
            payloads.push((collection.key(), payload));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for (key, payload) in &payloads {
            sqlx::query(
                r#"
                INSERT INTO collections (key, payload, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    payload = excluded.payload,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(*key)
            .bind(payload.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE store_meta SET last_updated = ?1 WHERE id = 1")
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(
            collections = ?payloads.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
            "Collections written"
        );
        Ok(())
    }

    /// Writes all five collections.
    pub async fn write_all(&self, document: &StoreDocument, now: DateTime<Utc>) -> DbResult<()> {
        self.write(document, Collection::ALL, now).await
    }

    pub async fn meta(&self) -> DbResult<StoreMeta> {
        let row: Option<(Option<DateTime<Utc>>, Option<DateTime<Utc>>, bool)> = sqlx::query_as(
            "SELECT last_updated, last_mirrored_at, seeded_from_demo FROM store_meta WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .map(|(last_updated, last_mirrored_at, seeded_from_demo)| StoreMeta {
                last_updated,
                last_mirrored_at,
                seeded_from_demo,
            })
            .unwrap_or_default())
    }

    /// Records that the stored collections came from the demo ledger.
    pub async fn mark_demo_seeded(&self) -> DbResult<()> {
        sqlx::query("UPDATE store_meta SET seeded_from_demo = 1 WHERE id = 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Records a successful remote mirror write.
    pub async fn mark_mirrored(&self, at: DateTime<Utc>) -> DbResult<()> {
        sqlx::query("UPDATE store_meta SET last_mirrored_at = ?1 WHERE id = 1")
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use sari_core::{Money, Product, Settings};

    use crate::{Database, DbConfig};

    use super::*;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    fn product(id: i64, name: &str) -> Product {
        Product {
            id,
            name: name.to_string(),
            category: "Snacks".to_string(),
            barcode: None,
            quantity: 4,
            original_price: Money::from_cents(1000),
            selling_price: Money::from_cents(1250),
            total_sold: 0,
            created_date: Some(at(1)),
        }
    }

    async fn repo() -> CollectionRepository {
        Database::new(DbConfig::in_memory())
            .await
            .unwrap()
            .collections()
    }

    #[tokio::test]
    async fn test_empty_database_loads_defaults() {
        let repo = repo().await;
        assert!(repo.is_empty().await.unwrap());

        let document = repo.load().await.unwrap();
        assert!(document.is_empty());
        assert_eq!(document.settings, Settings::default());
        assert_eq!(document.last_updated, None);
    }

    #[tokio::test]
    async fn test_write_all_then_load() {
        let repo = repo().await;
        let document = StoreDocument {
            products: vec![product(1, "Chips")],
            settings: Settings {
                low_stock_threshold: 8,
                ..Settings::default()
            },
            ..StoreDocument::default()
        };
        repo.write_all(&document, at(2)).await.unwrap();

        let loaded = repo.load().await.unwrap();
        assert_eq!(loaded.products, document.products);
        assert_eq!(loaded.settings.low_stock_threshold, 8);
        assert_eq!(loaded.last_updated, Some(at(2)));
        assert!(!repo.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_write_only_touched_collections() {
        let repo = repo().await;
        let mut document = StoreDocument {
            products: vec![product(1, "Chips")],
            ..StoreDocument::default()
        };
        repo.write_all(&document, at(2)).await.unwrap();

        // Products change in memory, but only settings are written
        document.products.push(product(2, "Soda"));
        document.settings.business_name = "Aling Nena's".to_string();
        repo.write(&document, [Collection::Settings], at(3))
            .await
            .unwrap();

        let loaded = repo.load().await.unwrap();
        assert_eq!(loaded.products.len(), 1);
        assert_eq!(loaded.settings.business_name, "Aling Nena's");
        assert_eq!(loaded.last_updated, Some(at(3)));
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_reported() {
        let repo = repo().await;
        sqlx::query(
            "INSERT INTO collections (key, payload, updated_at) VALUES ('sales', '{oops', '')",
        )
        .execute(&repo.pool)
        .await
        .unwrap();

        let err = repo.load().await.unwrap_err();
        assert!(matches!(
            err,
            DbError::InvalidPayload { ref collection, .. } if collection == "sales"
        ));
    }

    #[tokio::test]
    async fn test_unknown_rows_are_skipped() {
        let repo = repo().await;
        sqlx::query(
            "INSERT INTO collections (key, payload, updated_at) VALUES ('customers', '[]', '')",
        )
        .execute(&repo.pool)
        .await
        .unwrap();

        assert!(repo.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_mirrored() {
        let repo = repo().await;
        assert_eq!(repo.meta().await.unwrap(), StoreMeta::default());

        repo.mark_mirrored(at(5)).await.unwrap();
        assert_eq!(repo.meta().await.unwrap().last_mirrored_at, Some(at(5)));
    }

    #[tokio::test]
    async fn test_mark_demo_seeded() {
        let repo = repo().await;
        assert!(!repo.meta().await.unwrap().seeded_from_demo);

        repo.mark_demo_seeded().await.unwrap();
        assert!(repo.meta().await.unwrap().seeded_from_demo);
    }
}
