//! # Batch Matcher
//!
//! Matches a scanned (weight, price) reading against available vacuum-packed
//! inventory batches.
//!
//! ## Matching Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Batch Matching                                       │
//! │                                                                         │
//! │  scale reading (2.500 kg, Bs 120)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  find_candidates() ── filters ──► same product                         │
//! │       │                           not sold, not reserved               │
//! │       │                           not already in this cart             │
//! │       │                           |Δweight| < 0.001 kg   (strict)      │
//! │       │                           |Δprice|  < 0.01 Bs    (strict)      │
//! │       ▼                                                                 │
//! │  select_fifo() ── picks ────────► earliest packed_at                   │
//! │       │                           ties: smallest batch id              │
//! │       ▼                                                                 │
//! │  Some(batch) → consume          None → phantom path (reservation)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An empty candidate set is NOT an error: the reservation policy treats the
//! reading as an unregistered ("phantom") batch.

use rust_decimal::Decimal;

use crate::money::Money;
use crate::types::ProductBatch;
use crate::{PRICE_TOLERANCE_BS, WEIGHT_TOLERANCE_KG};

/// Finds every batch that could be the scanned package.
///
/// A batch is a candidate iff it belongs to `product_id`, is neither sold nor
/// reserved, its id is not already on a line of the current cart (the same
/// physical package cannot be added twice), and both the weight and the price
/// are within tolerance — strictly: a weight difference of exactly 0.001 kg
/// is OUT of tolerance.
pub fn find_candidates<'a>(
    batches: &'a [ProductBatch],
    product_id: &str,
    in_cart_batch_ids: &[String],
    observed_weight_kg: Decimal,
    observed_price: Money,
) -> Vec<&'a ProductBatch> {
    batches
        .iter()
        .filter(|batch| batch.product_id == product_id)
        .filter(|batch| batch.is_available())
        .filter(|batch| !in_cart_batch_ids.iter().any(|id| *id == batch.id))
        .filter(|batch| (batch.actual_weight - observed_weight_kg).abs() < WEIGHT_TOLERANCE_KG)
        .filter(|batch| batch.unit_price.abs_diff(observed_price) < PRICE_TOLERANCE_BS)
        .collect()
}

/// Selects the oldest-packed candidate (FIFO — oldest stock leaves first).
///
/// Ties on `packed_at` are broken by batch id ordering, so repeated calls
/// over the same candidates always pick the same batch.
pub fn select_fifo<'a>(candidates: &[&'a ProductBatch]) -> Option<&'a ProductBatch> {
    candidates
        .iter()
        .min_by(|a, b| a.packed_at.cmp(&b.packed_at).then_with(|| a.id.cmp(&b.id)))
        .copied()
}

/// Convenience: filter and select in one step.
pub fn match_batch<'a>(
    batches: &'a [ProductBatch],
    product_id: &str,
    in_cart_batch_ids: &[String],
    observed_weight_kg: Decimal,
    observed_price: Money,
) -> Option<&'a ProductBatch> {
    let candidates = find_candidates(
        batches,
        product_id,
        in_cart_batch_ids,
        observed_weight_kg,
        observed_price,
    );
    select_fifo(&candidates)
}

// =============================================================================
// Unit Tests
// =============================================================================
