//! # Cart Session
//!
//! One open transaction at a register. The cart is wrapped in a `Mutex`
//! because multiple frontend commands may touch it concurrently, but only
//! one may modify it at a time.
//!
//! ## Scan Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Session Scan Flow                               │
//! │                                                                         │
//! │  scan(code)                                                             │
//! │    │                                                                    │
//! │    ├── 18-digit scale label? ──► decode ──► catalog by scale code       │
//! │    │                                           │                        │
//! │    │                              batches listed, policy resolved:      │
//! │    │                              ConsumeBatch ──► batch line added     │
//! │    │                              CreatePhantom ─► phantom line added   │
//! │    │                                                                    │
//! │    └── standard barcode ──► catalog by barcode string                   │
//! │                                  │                                      │
//! │                     unit-sale ──► one unit added                        │
//! │                     weight / vacuum-packed ──► NeedsInput(product):     │
//! │                       operator keys weight (or weight + price)          │
//! │                                                                         │
//! │  Collaborator calls happen OUTSIDE the cart lock; the lock is only      │
//! │  taken for the final cart mutation.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::ProductCatalog;
use crate::error::{CheckoutError, CheckoutResult};
use crate::inventory::BatchStore;
use crate::settlement::{self, SaleRecord, SaleRecorder, Tender};
use veta_core::{
    decode_scale_barcode, reservation, Cart, CartLine, CartTotals, Money, Product,
    ReservationRequest, Resolution, SaleType,
};

// =============================================================================
// Responses
// =============================================================================

/// Full cart snapshot for the frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
}

/// What a scan did.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum ScanOutcome {
    /// A line was added (or merged) and this is its id.
    LineAdded { line_id: String },

    /// The barcode resolved to a weight-sold or vacuum-packed product; the
    /// operator must key a quantity (or weight and price) to continue.
    NeedsInput { product: Product },
}

// =============================================================================
// Session
// =============================================================================

/// The open transaction at one register.
pub struct CartSession {
    catalog: Arc<dyn ProductCatalog>,
    batch_store: Arc<dyn BatchStore>,
    recorder: Arc<dyn SaleRecorder>,
    cart: Mutex<Cart>,
}

impl CartSession {
    pub fn new(
        catalog: Arc<dyn ProductCatalog>,
        batch_store: Arc<dyn BatchStore>,
        recorder: Arc<dyn SaleRecorder>,
    ) -> Self {
        CartSession {
            catalog,
            batch_store,
            recorder,
            cart: Mutex::new(Cart::new()),
        }
    }

    // -------------------------------------------------------------------------
    // Scan & add
    // -------------------------------------------------------------------------

    /// Routes a scanned code: scale labels go through batch matching and the
    /// reservation policy, everything else is a standard catalog lookup.
    pub async fn scan(&self, code: &str) -> CheckoutResult<ScanOutcome> {
        if let Some(reading) = decode_scale_barcode(code) {
            debug!(
                product_code = %reading.product_code,
                weight_kg = %reading.weight_kg,
                total = %reading.total_price,
                "scale label decoded"
            );
            return self.add_scanned_package(&reading).await;
        }

        // Standard barcode path
        let product = self
            .catalog
            .product_by_barcode(code)
            .await?
            .ok_or_else(|| CheckoutError::ProductNotFound(code.to_string()))?;

        match product.sale_type {
            SaleType::Unit => self.add_units(&product.id, 1).await,
            // Weight-sold goods need a keyed weight; vacuum-packed goods
            // scanned by product barcode (not scale label) need weight+price
            SaleType::Weight => Ok(ScanOutcome::NeedsInput { product }),
        }
    }

    async fn add_scanned_package(
        &self,
        reading: &veta_core::ScaleReading,
    ) -> CheckoutResult<ScanOutcome> {
        let product = self
            .catalog
            .product_by_scale_code(&reading.product_code)
            .await?
            .ok_or_else(|| CheckoutError::ProductNotFound(reading.product_code.clone()))?;

        let available_batches = self.batch_store.list_for_product(&product.id).await?;
        let in_cart = self.with_cart(Cart::batch_ids);

        let resolution = reservation::resolve(
            &product,
            ReservationRequest::ScannedPackage {
                reading,
                available_batches: &available_batches,
                in_cart_batch_ids: &in_cart,
            },
        )?;

        let line_id = match resolution {
            Resolution::ConsumeBatch(batch) => {
                info!(batch_number = %batch.batch_number, "scan matched registered batch");
                self.with_cart_mut(|c| c.add_batch(&product, &batch))?
            }
            Resolution::CreatePhantom {
                actual_weight,
                package_price,
            } => {
                warn!(
                    product = %product.sku,
                    weight_kg = %actual_weight,
                    "no batch matched scale label, adding unregistered package"
                );
                self.with_cart_mut(|c| c.add_phantom(&product, actual_weight, package_price))?
            }
            // Scale labels never resolve to unit additions
            Resolution::AddUnits { quantity } => {
                self.with_cart_mut(|c| c.add_product(&product, Decimal::from(quantity)))?
            }
        };
        Ok(ScanOutcome::LineAdded { line_id })
    }

    /// Adds discrete units of a unit-sale product.
    pub async fn add_units(&self, product_id: &str, quantity: i64) -> CheckoutResult<ScanOutcome> {
        let product = self.product(product_id).await?;
        let committed = self.with_cart(|c| c.committed_units(product_id));

        let resolution = reservation::resolve(
            &product,
            ReservationRequest::Units {
                quantity,
                committed_in_cart: committed,
            },
        )?;

        let line_id = match resolution {
            Resolution::AddUnits { quantity } => {
                self.with_cart_mut(|c| c.add_product(&product, Decimal::from(quantity)))?
            }
            other => {
                // Unit requests only ever resolve to AddUnits
                debug!(?other, "unexpected resolution for unit request");
                return Err(CheckoutError::ProductNotFound(product_id.to_string()));
            }
        };
        Ok(ScanOutcome::LineAdded { line_id })
    }

    /// Adds a keyed weight of a loose weight-sale product.
    ///
    /// Vacuum-packed goods are rejected here: they enter per physical
    /// package, through [`CartSession::scan`] or
    /// [`CartSession::manual_package`].
    pub async fn add_weight(
        &self,
        product_id: &str,
        weight_kg: Decimal,
    ) -> CheckoutResult<ScanOutcome> {
        let product = self.product(product_id).await?;
        let line_id = self.with_cart_mut(|c| c.add_product(&product, weight_kg))?;
        Ok(ScanOutcome::LineAdded { line_id })
    }

    /// Adds a package by keyed weight and price, for labels that will not
    /// scan or packages weighed at the counter.
    pub async fn manual_package(
        &self,
        product_id: &str,
        weight_kg: Decimal,
        package_price: Money,
    ) -> CheckoutResult<ScanOutcome> {
        let product = self.product(product_id).await?;

        let resolution = reservation::resolve(
            &product,
            ReservationRequest::ManualPackage {
                weight_kg,
                package_price,
            },
        )?;

        let line_id = match resolution {
            Resolution::CreatePhantom {
                actual_weight,
                package_price,
            } => self.with_cart_mut(|c| c.add_phantom(&product, actual_weight, package_price))?,
            // Manual packages only ever resolve to CreatePhantom
            _ => return Err(CheckoutError::ProductNotFound(product_id.to_string())),
        };
        Ok(ScanOutcome::LineAdded { line_id })
    }

    // -------------------------------------------------------------------------
    // Line operations
    // -------------------------------------------------------------------------

    pub fn update_quantity(&self, line_id: &str, quantity: Decimal) -> CheckoutResult<()> {
        self.with_cart_mut(|c| c.update_quantity(line_id, quantity))?;
        Ok(())
    }

    pub fn commit_line(&self, line_id: &str) -> CheckoutResult<()> {
        self.with_cart_mut(|c| c.commit_line(line_id))?;
        Ok(())
    }

    pub fn remove_line(&self, line_id: &str) -> CheckoutResult<()> {
        self.with_cart_mut(|c| c.remove_line(line_id))?;
        Ok(())
    }

    pub fn set_line_discount(&self, line_id: &str, amount: Money) -> CheckoutResult<()> {
        self.with_cart_mut(|c| c.set_line_discount(line_id, amount))?;
        Ok(())
    }

    pub fn set_line_unit_price(&self, line_id: &str, new_price: Money) -> CheckoutResult<()> {
        self.with_cart_mut(|c| c.set_line_unit_price(line_id, new_price))?;
        Ok(())
    }

    pub fn set_cart_discount(&self, amount: Money) -> CheckoutResult<()> {
        self.with_cart_mut(|c| c.set_cart_discount(amount))?;
        Ok(())
    }

    pub fn clear(&self) {
        self.with_cart_mut(Cart::clear);
    }

    pub fn view(&self) -> CartView {
        self.with_cart(|c| CartView {
            lines: c.lines.clone(),
            totals: CartTotals::from(c),
        })
    }

    // -------------------------------------------------------------------------
    // Settlement
    // -------------------------------------------------------------------------

    /// Settles the current cart. The cart is cloned out of the lock so no
    /// lock is held across await points; on success the session is cleared,
    /// on failure the draft stays intact for the operator to correct.
    pub async fn settle(&self, tender: Tender) -> CheckoutResult<SaleRecord> {
        let draft = self.with_cart(Cart::clone);
        let record = settlement::settle(
            draft,
            tender,
            self.batch_store.as_ref(),
            self.recorder.as_ref(),
        )
        .await?;
        self.with_cart_mut(Cart::clear);
        Ok(record)
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    async fn product(&self, product_id: &str) -> CheckoutResult<Product> {
        self.catalog
            .product_by_id(product_id)
            .await?
            .ok_or_else(|| CheckoutError::ProductNotFound(product_id.to_string()))
    }

    fn with_cart<R>(&self, f: impl FnOnce(&Cart) -> R) -> R {
        let cart = self.cart.lock().expect("Cart mutex poisoned");
        f(&cart)
    }

    fn with_cart_mut<R>(&self, f: impl FnOnce(&mut Cart) -> R) -> R {
        let mut cart = self.cart.lock().expect("Cart mutex poisoned");
        f(&mut cart)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::inventory::InMemoryBatchStore;
    use crate::settlement::InMemorySaleLog;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use veta_core::{CoreError, InventoryType, ProductBatch};

    fn unit_product(id: &str, barcode: &str, price_bs: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            sku: format!("SKU-{}", id),
            barcode: Some(barcode.to_string()),
            scale_code: None,
            name: format!("Product {}", id),
            category_id: None,
            sale_type: SaleType::Unit,
            inventory_type: InventoryType::Unit,
            unit_price: Money::from_bs(price_bs),
            stock_units: Some(stock),
            is_active: true,
        }
    }

    fn packed_product(id: &str, scale_code: &str) -> Product {
        Product {
            id: id.to_string(),
            sku: format!("SKU-{}", id),
            barcode: Some(format!("779{}", id)),
            scale_code: Some(scale_code.to_string()),
            name: "Charque Empacado".to_string(),
            category_id: None,
            sale_type: SaleType::Weight,
            inventory_type: InventoryType::VacuumPacked,
            unit_price: Money::from_bs(60),
            stock_units: None,
            is_active: true,
        }
    }

    fn session_with(
        products: Vec<Product>,
        batches: Vec<ProductBatch>,
    ) -> (CartSession, Arc<InMemoryBatchStore>, Arc<InMemorySaleLog>) {
        let store = Arc::new(InMemoryBatchStore::with_batches(batches));
        let log = Arc::new(InMemorySaleLog::new());
        let session = CartSession::new(
            Arc::new(InMemoryCatalog::with_products(products)),
            store.clone(),
            log.clone(),
        );
        (session, store, log)
    }

    #[tokio::test]
    async fn test_standard_barcode_adds_one_unit() {
        let (session, _, _) = session_with(vec![unit_product("p1", "7790001", 12, 10)], vec![]);

        let outcome = session.scan("7790001").await.unwrap();
        assert!(matches!(outcome, ScanOutcome::LineAdded { .. }));

        let view = session.view();
        assert_eq!(view.lines[0].quantity, dec!(1));
        assert_eq!(view.totals.total, Money::from_bs(12));
    }

    #[tokio::test]
    async fn test_standard_barcode_merges_on_rescan() {
        let (session, _, _) = session_with(vec![unit_product("p1", "7790001", 12, 10)], vec![]);

        session.scan("7790001").await.unwrap();
        session.scan("7790001").await.unwrap();

        let view = session.view();
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].quantity, dec!(2));
    }

    #[tokio::test]
    async fn test_weight_barcode_asks_for_input() {
        let (session, _, _) = session_with(vec![packed_product("p1", "000123")], vec![]);

        let outcome = session.scan("779p1").await.unwrap();
        match outcome {
            ScanOutcome::NeedsInput { product } => assert_eq!(product.id, "p1"),
            other => panic!("expected NeedsInput, got {other:?}"),
        }
        assert!(session.view().lines.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_barcode_not_found() {
        let (session, _, _) = session_with(vec![], vec![]);
        let err = session.scan("0000000").await.unwrap_err();
        assert!(matches!(err, CheckoutError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn test_scale_label_consumes_matching_batch() {
        // Label: flag 0, product 000123, 2.500 kg, Bs 150, check 7
        let batch = ProductBatch {
            id: "b1".to_string(),
            product_id: "p1".to_string(),
            batch_number: "L-0001".to_string(),
            actual_weight: dec!(2.500),
            unit_price: Money::from_bs(150),
            packed_at: Utc::now(),
            is_sold: false,
            is_reserved: false,
        };
        let (session, _, _) = session_with(vec![packed_product("p1", "000123")], vec![batch]);

        session.scan("000012302500001507").await.unwrap();

        let view = session.view();
        assert_eq!(view.lines[0].batch_id(), Some("b1"));
        assert_eq!(view.totals.total, Money::from_bs(150));
    }

    #[tokio::test]
    async fn test_scale_label_without_batch_creates_phantom() {
        let (session, _, _) = session_with(vec![packed_product("p1", "000123")], vec![]);

        session.scan("000012302500001507").await.unwrap();

        let view = session.view();
        assert!(view.lines[0].needs_batch_creation());
        assert_eq!(view.lines[0].actual_weight(), Some(dec!(2.500)));
        assert_eq!(view.totals.total, Money::from_bs(150));
    }

    #[tokio::test]
    async fn test_same_physical_package_not_scanned_twice() {
        let batch = ProductBatch {
            id: "b1".to_string(),
            product_id: "p1".to_string(),
            batch_number: "L-0001".to_string(),
            actual_weight: dec!(2.500),
            unit_price: Money::from_bs(150),
            packed_at: Utc::now(),
            is_sold: false,
            is_reserved: false,
        };
        let (session, _, _) = session_with(vec![packed_product("p1", "000123")], vec![batch]);

        session.scan("000012302500001507").await.unwrap();
        // Rescan: b1 is in the cart, no other batch matches, so the label
        // falls through to a phantom rather than double-consuming b1
        session.scan("000012302500001507").await.unwrap();

        let view = session.view();
        assert_eq!(view.lines.len(), 2);
        assert!(view.lines[1].needs_batch_creation());
    }

    #[tokio::test]
    async fn test_add_weight_rejects_vacuum_packed() {
        let (session, _, _) = session_with(vec![packed_product("p1", "000123")], vec![]);

        let err = session.add_weight("p1", dec!(1.5)).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::BatchTrackingRequired { .. })
        ));
        assert!(session.view().lines.is_empty());
    }

    #[tokio::test]
    async fn test_manual_package_rejects_zero_weight() {
        let (session, _, _) = session_with(vec![packed_product("p1", "000123")], vec![]);

        let err = session
            .manual_package("p1", dec!(0), Money::from_bs(50))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Core(_)));
        assert!(session.view().lines.is_empty());
    }

    #[tokio::test]
    async fn test_unit_stock_gate_counts_cart_lines() {
        let (session, _, _) = session_with(vec![unit_product("p1", "7790001", 12, 3)], vec![]);

        session.add_units("p1", 2).await.unwrap();
        let err = session.add_units("p1", 2).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Core(_)));

        // One more still fits
        session.add_units("p1", 1).await.unwrap();
        assert_eq!(session.view().lines[0].quantity, dec!(3));
    }

    #[tokio::test]
    async fn test_settle_clears_session_on_success() {
        let (session, _, log) = session_with(vec![unit_product("p1", "7790001", 12, 10)], vec![]);

        session.scan("7790001").await.unwrap();
        let record = session
            .settle(Tender::Cash {
                tendered: Money::from_bs(20),
            })
            .await
            .unwrap();

        assert_eq!(record.change, Money::from_bs(8));
        assert!(session.view().lines.is_empty());
        assert_eq!(log.recorded().len(), 1);
    }

    #[tokio::test]
    async fn test_settle_failure_keeps_draft() {
        let (session, store, log) = session_with(vec![packed_product("p1", "000123")], vec![]);

        session.scan("000012302500001507").await.unwrap();
        store.set_fail_creation(true);
        let err = session.settle(Tender::Electronic).await.unwrap_err();

        assert!(matches!(err, CheckoutError::BatchCreationFailed { .. }));
        // Draft intact, still phantom, ready for retry
        let view = session.view();
        assert_eq!(view.lines.len(), 1);
        assert!(view.lines[0].needs_batch_creation());
        assert!(log.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_settle_retry_after_transient_recording_failure() {
        let batch = ProductBatch {
            id: "b1".to_string(),
            product_id: "p1".to_string(),
            batch_number: "L-0001".to_string(),
            actual_weight: dec!(2.500),
            unit_price: Money::from_bs(150),
            packed_at: Utc::now(),
            is_sold: false,
            is_reserved: false,
        };
        let (session, store, log) = session_with(vec![packed_product("p1", "000123")], vec![batch]);
        session.scan("000012302500001507").await.unwrap();

        log.set_fail_recording(true);
        let err = session.settle(Tender::Electronic).await.unwrap_err();
        assert!(matches!(err, CheckoutError::RecordingFailed(_)));
        // The claimed batch is released; the retained draft can settle as-is
        assert!(!store.get("b1").unwrap().is_sold);
        assert_eq!(session.view().lines.len(), 1);

        log.set_fail_recording(false);
        let record = session.settle(Tender::Electronic).await.unwrap();
        assert_eq!(record.lines[0].batch_id.as_deref(), Some("b1"));
        assert!(store.get("b1").unwrap().is_sold);
        assert!(session.view().lines.is_empty());
    }

    #[tokio::test]
    async fn test_view_serializes_camel_case() {
        let (session, _, _) = session_with(vec![unit_product("p1", "7790001", 12, 10)], vec![]);
        session.scan("7790001").await.unwrap();

        let json = serde_json::to_value(session.view()).unwrap();
        assert!(json["totals"]["lineCount"].is_number());
        assert_eq!(json["lines"][0]["unitPrice"], serde_json::json!("12"));
    }

    #[tokio::test]
    async fn test_full_flow_scan_to_receipt() {
        let batch = ProductBatch {
            id: "b1".to_string(),
            product_id: "p2".to_string(),
            batch_number: "L-0001".to_string(),
            actual_weight: dec!(1.500),
            unit_price: Money::from_bs(75),
            packed_at: Utc::now(),
            is_sold: false,
            is_reserved: false,
        };
        let (session, store, _) = session_with(
            vec![
                unit_product("p1", "7790001", 12, 10),
                packed_product("p2", "000123"),
            ],
            vec![batch],
        );

        session.scan("7790001").await.unwrap();
        // 1.500 kg at Bs 75 matches the stored batch
        session.scan("000012301500000753").await.unwrap();

        let record = session.settle(Tender::Electronic).await.unwrap();
        assert_eq!(record.total, Money::from_bs(87));
        assert_eq!(record.lines.len(), 2);
        assert!(store.get("b1").unwrap().is_sold);
    }
}
