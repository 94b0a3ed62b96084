//! # Settlement
//!
//! Turns a sellable cart into a persisted sale:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Settlement Pipeline                              │
//! │                                                                         │
//! │  Cart ──► sellable? ──► tender ok? ──► phantoms: create_batch +        │
//! │                                        register ──► batches: mark_sold │
//! │                                             │              │            │
//! │                                        abort all      Conflict ──►     │
//! │                                        on failure     ReservationConflict│
//! │                                             │              │            │
//! │                                             ▼              ▼            │
//! │                                     SaleRecord assembled, recorded      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//! - Phantom batch records are created BEFORE the sale is recorded: a sale
//!   line must never reference a batch id that does not exist. Any creation
//!   failure aborts the whole settlement.
//! - Every batch line is re-validated via `mark_sold` right before
//!   recording; a batch taken by another terminal surfaces as
//!   [`CheckoutError::ReservationConflict`] and is never silently swapped
//!   for a different batch.
//! - Any failure after the first claim releases the batches this attempt
//!   already claimed. An aborted settlement leaves every batch exactly as
//!   it found it, so the retained draft can be retried as-is.
//! - Stock and reservation state change only here, never while the cart is
//!   being edited.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CheckoutError, CheckoutResult, StoreError};
use crate::inventory::{BatchStore, NewBatch};
use veta_core::{Cart, CartTotals, Money, SaleType};

// =============================================================================
// Tender
// =============================================================================

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Electronic,
}

/// Payment presented at settlement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "method")]
pub enum Tender {
    /// Cash: `tendered` must cover the cart total; change is returned.
    Cash { tendered: Money },
    /// QR / card: charged for the exact total, no change.
    Electronic,
}

impl Tender {
    fn method(&self) -> PaymentMethod {
        match self {
            Tender::Cash { .. } => PaymentMethod::Cash,
            Tender::Electronic => PaymentMethod::Electronic,
        }
    }
}

// =============================================================================
// Sale Record
// =============================================================================

/// Snapshot of a settled line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub line_id: String,
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub sale_type: SaleType,
    pub quantity: Decimal,
    pub unit_price: Money,
    pub discount: Money,
    pub subtotal: Money,
    pub total: Money,
    /// Inventory batch consumed, for package lines. Always a real id by the
    /// time the record exists (phantom lines are registered first).
    pub batch_id: Option<String>,
    pub batch_number: Option<String>,
    pub actual_weight: Option<Decimal>,
}

/// The persisted sale. All product data is frozen at settlement time so the
/// receipt stays reprintable after catalog edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub id: String,
    pub receipt_number: String,
    pub lines: Vec<SaleLine>,
    pub subtotal: Money,
    pub item_discounts_total: Money,
    pub cart_discount: Money,
    pub total: Money,
    pub payment_method: PaymentMethod,
    /// Cash only.
    pub amount_tendered: Option<Money>,
    /// Cash only; zero for electronic.
    pub change: Money,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale Recorder Seam
// =============================================================================

/// Persistence collaborator for completed sales.
#[async_trait]
pub trait SaleRecorder: Send + Sync {
    async fn record_sale(&self, record: &SaleRecord) -> Result<(), StoreError>;
}

/// In-memory sale log for tests and local demos.
#[derive(Debug, Default)]
pub struct InMemorySaleLog {
    sales: Mutex<Vec<SaleRecord>>,
    fail_recording: Mutex<bool>,
}

impl InMemorySaleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_recording(&self, fail: bool) {
        *self.fail_recording.lock().expect("sale log poisoned") = fail;
    }

    pub fn recorded(&self) -> Vec<SaleRecord> {
        self.sales.lock().expect("sale log poisoned").clone()
    }
}

#[async_trait]
impl SaleRecorder for InMemorySaleLog {
    async fn record_sale(&self, record: &SaleRecord) -> Result<(), StoreError> {
        if *self.fail_recording.lock().expect("sale log poisoned") {
            return Err(StoreError::Unavailable("sale log write failed".to_string()));
        }
        self.sales
            .lock()
            .expect("sale log poisoned")
            .push(record.clone());
        Ok(())
    }
}

// =============================================================================
// Settlement
// =============================================================================

/// Settles a cart: registers phantom batches, claims matched batches, and
/// records the sale. Takes the cart by value (drained from the session) so
/// no lock is held across await points.
pub async fn settle(
    mut cart: Cart,
    tender: Tender,
    batch_store: &dyn BatchStore,
    recorder: &dyn SaleRecorder,
) -> CheckoutResult<SaleRecord> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    cart.ensure_sellable()?;

    let totals = CartTotals::from(&cart);
    let (amount_tendered, change) = match tender {
        Tender::Cash { tendered } => {
            if tendered < totals.total {
                return Err(CheckoutError::InsufficientTender {
                    total: totals.total,
                    tendered,
                });
            }
            (Some(tendered), tendered - totals.total)
        }
        Tender::Electronic => (None, Money::zero()),
    };

    debug!(
        lines = cart.line_count(),
        total = %totals.total,
        "settling cart"
    );

    // Phantom lines first: every sale line must point at a real batch record
    // before anything is persisted. A single failure aborts the settlement.
    let phantoms: Vec<(String, Decimal, Money)> = cart
        .lines
        .iter()
        .filter(|l| l.needs_batch_creation())
        .filter_map(|l| l.actual_weight().map(|w| (l.id.clone(), w, l.unit_price)))
        .collect();
    for (line_id, actual_weight, unit_price) in phantoms {
        let batch = batch_store
            .create_batch(NewBatch {
                product_id: cart.find_line(&line_id)?.product_id.clone(),
                batch_number: generate_batch_number(),
                actual_weight,
                unit_price,
                packed_at: Utc::now(),
            })
            .await
            .map_err(|e| CheckoutError::BatchCreationFailed {
                line_id: line_id.clone(),
                reason: e.to_string(),
            })?;
        cart.register_batch(&line_id, &batch.id, &batch.batch_number)?;
    }

    // Claim every batch on the cart, including the ones just registered. A
    // race lost here names the line so the operator can re-resolve it, and
    // batches already claimed for this attempt are released first: an
    // aborted settlement must leave the draft retryable, never holding a
    // consumed batch with no recorded sale.
    let mut claimed: Vec<String> = Vec::new();
    for line in &cart.lines {
        if let Some(batch_id) = line.batch_id() {
            match batch_store.mark_sold(batch_id).await {
                Ok(()) => claimed.push(batch_id.to_string()),
                Err(e) => {
                    release_claimed(batch_store, &claimed).await;
                    return Err(match e {
                        StoreError::Conflict(_) => CheckoutError::ReservationConflict {
                            line_id: line.id.clone(),
                            batch_id: batch_id.to_string(),
                        },
                        other => CheckoutError::Store(other),
                    });
                }
            }
        }
    }

    let record = SaleRecord {
        id: Uuid::new_v4().to_string(),
        receipt_number: generate_receipt_number(),
        lines: cart
            .lines
            .iter()
            .map(|l| SaleLine {
                line_id: l.id.clone(),
                product_id: l.product_id.clone(),
                sku: l.sku.clone(),
                name: l.name.clone(),
                sale_type: l.sale_type,
                quantity: l.quantity,
                unit_price: l.unit_price,
                discount: l.discount,
                subtotal: l.subtotal(),
                total: l.total(),
                batch_id: l.batch_id().map(str::to_string),
                batch_number: l.batch_number().map(str::to_string),
                actual_weight: l.actual_weight(),
            })
            .collect(),
        subtotal: totals.subtotal,
        item_discounts_total: totals.item_discounts_total,
        cart_discount: totals.cart_discount,
        total: totals.total,
        payment_method: tender.method(),
        amount_tendered,
        change,
        created_at: Utc::now(),
    };

    if let Err(e) = recorder.record_sale(&record).await {
        release_claimed(batch_store, &claimed).await;
        return Err(CheckoutError::RecordingFailed(e.to_string()));
    }

    info!(
        receipt = %record.receipt_number,
        total = %record.total,
        lines = record.lines.len(),
        "sale recorded"
    );

    Ok(record)
}

/// Receipt number: `YYMMDD-HHMMSS-NNNN`, unique enough per terminal.
fn generate_receipt_number() -> String {
    let now = Utc::now();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    format!("{}-{:04}", now.format("%y%m%d-%H%M%S"), nanos % 10000)
}

/// Releases batches claimed by a settlement attempt that is aborting.
async fn release_claimed(batch_store: &dyn BatchStore, claimed: &[String]) {
    for batch_id in claimed {
        // The sale did not happen; a batch that cannot be released here is
        // logged for manual reconciliation.
        if let Err(e) = batch_store.release(batch_id).await {
            warn!(batch_id = %batch_id, error = %e, "failed to release claimed batch");
        }
    }
}

/// Batch number for counter-weighed packages registered at settlement.
fn generate_batch_number() -> String {
    let now = Utc::now();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("PKG-{}-{}", now.format("%y%m%d"), &suffix[..6].to_uppercase())
}

// =============================================================================
// Unit Tests
// =============================================================================
