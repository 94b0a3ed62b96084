//! # Batch Store Seam
//!
//! Vacuum-packed batches are shared inventory: two terminals must not both
//! sell the same physical package. The authoritative reservation lock lives
//! server-side; this seam returns snapshots with `is_sold` / `is_reserved`
//! flags, and settlement re-validates through [`BatchStore::mark_sold`],
//! which loses the race loudly instead of double-selling.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::StoreError;
use veta_core::{Money, ProductBatch};

// =============================================================================
// New Batch
// =============================================================================

/// Payload for registering a batch (phantom-line settlement).
#[derive(Debug, Clone)]
pub struct NewBatch {
    pub product_id: String,
    pub batch_number: String,
    /// Actual weight in kilograms, 3dp.
    pub actual_weight: Decimal,
    /// Price for the whole package in Bs.
    pub unit_price: Money,
    pub packed_at: DateTime<Utc>,
}

// =============================================================================
// Trait
// =============================================================================

/// Inventory collaborator for vacuum-packed batches.
#[async_trait]
pub trait BatchStore: Send + Sync {
    /// Lists every batch of a product with its current sold/reserved
    /// snapshot. Candidate filtering is the matcher's job, not the store's.
    async fn list_for_product(&self, product_id: &str) -> Result<Vec<ProductBatch>, StoreError>;

    /// Registers a new batch record and returns it with its real id.
    ///
    /// Called during settlement for phantom lines, BEFORE the sale is
    /// recorded: a recorded sale line must never reference a batch id that
    /// does not exist.
    async fn create_batch(&self, new_batch: NewBatch) -> Result<ProductBatch, StoreError>;

    /// Marks a batch sold. Fails with [`StoreError::Conflict`] if another
    /// transaction sold or reserved it since it was matched.
    async fn mark_sold(&self, batch_id: &str) -> Result<(), StoreError>;

    /// Releases a batch claimed by [`BatchStore::mark_sold`].
    ///
    /// Settlement compensates with this when a later claim conflicts or the
    /// sale cannot be recorded: an aborted settlement must never leave a
    /// batch consumed without a recorded sale.
    async fn release(&self, batch_id: &str) -> Result<(), StoreError>;
}

// =============================================================================
// In-Memory Implementation
// =============================================================================

/// In-memory batch store for tests and local demos.
///
/// `fail_creation` simulates an unreachable inventory collaborator so
/// settlement-abort behavior can be exercised.
#[derive(Debug, Default)]
pub struct InMemoryBatchStore {
    batches: Mutex<HashMap<String, ProductBatch>>,
    fail_creation: Mutex<bool>,
}

impl InMemoryBatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batches(batches: impl IntoIterator<Item = ProductBatch>) -> Self {
        InMemoryBatchStore {
            batches: Mutex::new(batches.into_iter().map(|b| (b.id.clone(), b)).collect()),
            fail_creation: Mutex::new(false),
        }
    }

    /// Makes every subsequent `create_batch` fail (collaborator down).
    pub fn set_fail_creation(&self, fail: bool) {
        *self.fail_creation.lock().expect("batch store poisoned") = fail;
    }

    /// Simulates another terminal reserving a batch after it was listed.
    pub fn reserve(&self, batch_id: &str) {
        if let Some(batch) = self
            .batches
            .lock()
            .expect("batch store poisoned")
            .get_mut(batch_id)
        {
            batch.is_reserved = true;
        }
    }

    pub fn get(&self, batch_id: &str) -> Option<ProductBatch> {
        self.batches
            .lock()
            .expect("batch store poisoned")
            .get(batch_id)
            .cloned()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().expect("batch store poisoned").len()
    }
}

#[async_trait]
impl BatchStore for InMemoryBatchStore {
    async fn list_for_product(&self, product_id: &str) -> Result<Vec<ProductBatch>, StoreError> {
        Ok(self
            .batches
            .lock()
            .expect("batch store poisoned")
            .values()
            .filter(|b| b.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn create_batch(&self, new_batch: NewBatch) -> Result<ProductBatch, StoreError> {
        if *self.fail_creation.lock().expect("batch store poisoned") {
            return Err(StoreError::Unavailable(
                "batch registry rejected the create call".to_string(),
            ));
        }

        let batch = ProductBatch {
            id: Uuid::new_v4().to_string(),
            product_id: new_batch.product_id,
            batch_number: new_batch.batch_number,
            actual_weight: new_batch.actual_weight,
            unit_price: new_batch.unit_price,
            packed_at: new_batch.packed_at,
            is_sold: false,
            is_reserved: false,
        };
        self.batches
            .lock()
            .expect("batch store poisoned")
            .insert(batch.id.clone(), batch.clone());
        Ok(batch)
    }

    async fn mark_sold(&self, batch_id: &str) -> Result<(), StoreError> {
        let mut batches = self.batches.lock().expect("batch store poisoned");
        let batch = batches
            .get_mut(batch_id)
            .ok_or_else(|| StoreError::NotFound(format!("batch {batch_id}")))?;

        if batch.is_sold {
            return Err(StoreError::Conflict(format!(
                "batch {batch_id} already sold"
            )));
        }
        if batch.is_reserved {
            return Err(StoreError::Conflict(format!(
                "batch {batch_id} reserved by another transaction"
            )));
        }
        batch.is_sold = true;
        Ok(())
    }

    async fn release(&self, batch_id: &str) -> Result<(), StoreError> {
        let mut batches = self.batches.lock().expect("batch store poisoned");
        let batch = batches
            .get_mut(batch_id)
            .ok_or_else(|| StoreError::NotFound(format!("batch {batch_id}")))?;
        batch.is_sold = false;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn batch(id: &str, product_id: &str) -> ProductBatch {
        ProductBatch {
            id: id.to_string(),
            product_id: product_id.to_string(),
            batch_number: format!("L-{}", id),
            actual_weight: dec!(2.500),
            unit_price: Money::from_bs(120),
            packed_at: Utc::now(),
            is_sold: false,
            is_reserved: false,
        }
    }

    #[tokio::test]
    async fn test_list_includes_flags() {
        let store = InMemoryBatchStore::with_batches([batch("b1", "p1"), batch("b2", "p2")]);
        store.reserve("b1");

        let listed = store.list_for_product("p1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].is_reserved);
    }

    #[tokio::test]
    async fn test_create_assigns_real_id() {
        let store = InMemoryBatchStore::new();
        let created = store
            .create_batch(NewBatch {
                product_id: "p1".to_string(),
                batch_number: "L-0001".to_string(),
                actual_weight: dec!(1.850),
                unit_price: Money::from_bs(92),
                packed_at: Utc::now(),
            })
            .await
            .unwrap();

        assert!(!created.id.is_empty());
        assert_eq!(store.get(&created.id).unwrap().actual_weight, dec!(1.850));
    }

    #[tokio::test]
    async fn test_mark_sold_conflicts() {
        let store = InMemoryBatchStore::with_batches([batch("b1", "p1"), batch("b2", "p1")]);

        store.mark_sold("b1").await.unwrap();
        // Second attempt loses the race
        assert!(matches!(
            store.mark_sold("b1").await,
            Err(StoreError::Conflict(_))
        ));

        store.reserve("b2");
        assert!(matches!(
            store.mark_sold("b2").await,
            Err(StoreError::Conflict(_))
        ));

        assert!(matches!(
            store.mark_sold("missing").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_release_undoes_a_claim() {
        let store = InMemoryBatchStore::with_batches([batch("b1", "p1")]);

        store.mark_sold("b1").await.unwrap();
        store.release("b1").await.unwrap();
        assert!(!store.get("b1").unwrap().is_sold);

        // Claimable again after the release
        store.mark_sold("b1").await.unwrap();
        assert!(store.get("b1").unwrap().is_sold);
    }
}
