//! # Reservation Policy
//!
//! Decides what happens to inventory when goods enter the cart.
//!
//! ## Decision Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Reservation Decisions                                │
//! │                                                                         │
//! │  Vacuum-packed, scanned, batch matched    → ConsumeBatch(batch)        │
//! │  Vacuum-packed, scanned, no match         → CreatePhantom{w, p}        │
//! │  Vacuum-packed, manual weight+price       → CreatePhantom{w, p}        │
//! │  Manual entry with weight ≤ 0 / price ≤ 0 → reject (cart unchanged)    │
//! │  Unit-tracked, enough stock               → AddUnits{n}                │
//! │  Unit-tracked, stock − in-cart < n        → reject InsufficientStock   │
//! │                                                                         │
//! │  Phantom batches are NOT registered here: settlement creates the       │
//! │  inventory record and back-fills the id. Unit stock is NOT             │
//! │  decremented here either; the draft only carries a running             │
//! │  reservation ("committed in cart").                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The authoritative reservation lock lives server-side: `is_reserved` on a
//! batch is a snapshot, and a race between two terminals is resolved at
//! settlement by rejecting the second attempt — a conflict, not a crash.

use rust_decimal::Decimal;

use crate::barcode::ScaleReading;
use crate::batch;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{InventoryType, Product, ProductBatch};
use crate::validation::validate_manual_entry;

// =============================================================================
// Request / Resolution
// =============================================================================

/// What the operator is trying to add.
#[derive(Debug)]
pub enum ReservationRequest<'a> {
    /// A scale label was scanned for a vacuum-packed product.
    ScannedPackage {
        reading: &'a ScaleReading,
        available_batches: &'a [ProductBatch],
        in_cart_batch_ids: &'a [String],
    },

    /// The operator keyed weight and price for a package whose label would
    /// not scan (or that was packed moments ago and never labelled).
    ManualPackage {
        weight_kg: Decimal,
        package_price: Money,
    },

    /// Discrete units of a unit-sale product.
    Units {
        quantity: i64,
        /// Units of this product already committed on lines of this draft.
        committed_in_cart: i64,
    },
}

/// The policy's verdict. Rejections are typed errors, not a variant: the
/// cart stays untouched and the operator corrects and retries.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Consume an existing registered batch: line with `batch_id`, qty 1,
    /// unit price = the package price.
    ConsumeBatch(ProductBatch),

    /// Create a phantom line now; settlement registers the batch.
    CreatePhantom {
        actual_weight: Decimal,
        package_price: Money,
    },

    /// Add `quantity` units; persistent stock is decremented at settlement.
    AddUnits { quantity: i64 },
}

// =============================================================================
// Policy
// =============================================================================

/// Resolves a reservation request against a product.
pub fn resolve(product: &Product, request: ReservationRequest<'_>) -> CoreResult<Resolution> {
    match request {
        ReservationRequest::ScannedPackage {
            reading,
            available_batches,
            in_cart_batch_ids,
        } => {
            if !product.is_vacuum_packed() {
                return Err(CoreError::NotBatchTracked {
                    sku: product.sku.clone(),
                });
            }

            match batch::match_batch(
                available_batches,
                &product.id,
                in_cart_batch_ids,
                reading.weight_kg,
                reading.total_price,
            ) {
                Some(matched) => Ok(Resolution::ConsumeBatch(matched.clone())),
                // Unregistered package: same validity rules as manual entry
                // (a label claiming 0 g or Bs 0 is a misprint, not a sale)
                None => {
                    validate_manual_entry(reading.weight_kg, reading.total_price)?;
                    Ok(Resolution::CreatePhantom {
                        actual_weight: reading.weight_kg,
                        package_price: reading.total_price,
                    })
                }
            }
        }

        ReservationRequest::ManualPackage {
            weight_kg,
            package_price,
        } => {
            if !product.is_vacuum_packed() {
                return Err(CoreError::NotBatchTracked {
                    sku: product.sku.clone(),
                });
            }
            validate_manual_entry(weight_kg, package_price)?;
            Ok(Resolution::CreatePhantom {
                actual_weight: weight_kg,
                package_price,
            })
        }

        ReservationRequest::Units {
            quantity,
            committed_in_cart,
        } => {
            if quantity <= 0 {
                return Err(CoreError::Validation(ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                }));
            }
            // Only unit-tracked inventory is stock-gated; untracked products
            // are always sellable.
            if product.inventory_type == InventoryType::Unit {
                let available = product.available_units(committed_in_cart);
                if available < quantity {
                    return Err(CoreError::InsufficientStock {
                        sku: product.sku.clone(),
                        available: available.max(0),
                        requested: quantity,
                    });
                }
            }
            Ok(Resolution::AddUnits { quantity })
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barcode::decode_scale_barcode;
    use crate::types::{InventoryType, SaleType};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn vacuum_product() -> Product {
        Product {
            id: "p-lomo".to_string(),
            sku: "LOMO-VAC".to_string(),
            barcode: None,
            scale_code: Some("000123".to_string()),
            name: "Lomo fino al vacío".to_string(),
            category_id: None,
            sale_type: SaleType::Weight,
            inventory_type: InventoryType::VacuumPacked,
            unit_price: Money::from_bs(48),
            stock_units: None,
            is_active: true,
        }
    }

    fn unit_product(stock: i64) -> Product {
        Product {
            id: "p-chorizo".to_string(),
            sku: "CHORIZO-6".to_string(),
            barcode: Some("7791234500001".to_string()),
            scale_code: None,
            name: "Chorizo parrillero x6".to_string(),
            category_id: None,
            sale_type: SaleType::Unit,
            inventory_type: InventoryType::Unit,
            unit_price: Money::from_bs(35),
            stock_units: Some(stock),
            is_active: true,
        }
    }

    fn registered_batch(id: &str, weight: Decimal, price: i64) -> ProductBatch {
        ProductBatch {
            id: id.to_string(),
            product_id: "p-lomo".to_string(),
            batch_number: format!("L-{}", id),
            actual_weight: weight,
            unit_price: Money::from_bs(price),
            packed_at: Utc::now(),
            is_sold: false,
            is_reserved: false,
        }
    }

    #[test]
    fn test_scanned_with_match_consumes() {
        let product = vacuum_product();
        // 1.500 kg, Bs 75
        let reading = decode_scale_barcode("000012301500000750").unwrap();
        let batches = vec![registered_batch("b1", dec!(1.500), 75)];

        let resolution = resolve(
            &product,
            ReservationRequest::ScannedPackage {
                reading: &reading,
                available_batches: &batches,
                in_cart_batch_ids: &[],
            },
        )
        .unwrap();

        match resolution {
            Resolution::ConsumeBatch(batch) => assert_eq!(batch.id, "b1"),
            other => panic!("expected consume, got {other:?}"),
        }
    }

    /// No matching batch is not an error: the reading becomes a phantom line
    /// and settlement registers the batch (or aborts entirely).
    #[test]
    fn test_scanned_without_match_creates_phantom() {
        let product = vacuum_product();
        let reading = decode_scale_barcode("000012301500000750").unwrap();

        let resolution = resolve(
            &product,
            ReservationRequest::ScannedPackage {
                reading: &reading,
                available_batches: &[],
                in_cart_batch_ids: &[],
            },
        )
        .unwrap();

        assert_eq!(
            resolution,
            Resolution::CreatePhantom {
                actual_weight: dec!(1.500),
                package_price: Money::from_bs(75),
            }
        );
    }

    #[test]
    fn test_manual_entry_creates_phantom() {
        let product = vacuum_product();
        let resolution = resolve(
            &product,
            ReservationRequest::ManualPackage {
                weight_kg: dec!(1.850),
                package_price: Money::from_bs(92),
            },
        )
        .unwrap();
        assert!(matches!(resolution, Resolution::CreatePhantom { .. }));
    }

    #[test]
    fn test_manual_entry_rejects_non_positive_values() {
        let product = vacuum_product();
        for (weight, price) in [
            (dec!(0), Money::from_bs(92)),
            (dec!(-1.5), Money::from_bs(92)),
            (dec!(1.850), Money::zero()),
            (dec!(1.850), Money::from_bs(-5)),
        ] {
            let err = resolve(
                &product,
                ReservationRequest::ManualPackage {
                    weight_kg: weight,
                    package_price: price,
                },
            )
            .unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)));
        }
    }

    #[test]
    fn test_package_request_on_non_vacuum_product_rejected() {
        let product = unit_product(10);
        let err = resolve(
            &product,
            ReservationRequest::ManualPackage {
                weight_kg: dec!(1.0),
                package_price: Money::from_bs(50),
            },
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::NotBatchTracked { .. }));
    }

    #[test]
    fn test_units_allowed_within_stock() {
        let product = unit_product(5);
        let resolution = resolve(
            &product,
            ReservationRequest::Units {
                quantity: 2,
                committed_in_cart: 3,
            },
        )
        .unwrap();
        assert_eq!(resolution, Resolution::AddUnits { quantity: 2 });
    }

    #[test]
    fn test_untracked_units_never_stock_gated() {
        let product = Product {
            inventory_type: InventoryType::Untracked,
            stock_units: None,
            ..unit_product(0)
        };
        let resolution = resolve(
            &product,
            ReservationRequest::Units {
                quantity: 40,
                committed_in_cart: 10,
            },
        )
        .unwrap();
        assert_eq!(resolution, Resolution::AddUnits { quantity: 40 });
    }

    #[test]
    fn test_units_rejected_when_draft_exhausts_stock() {
        let product = unit_product(5);
        let err = resolve(
            &product,
            ReservationRequest::Units {
                quantity: 1,
                committed_in_cart: 5,
            },
        )
        .unwrap_err();
        match err {
            CoreError::InsufficientStock { available, .. } => assert_eq!(available, 0),
            other => panic!("unexpected error: {other}"),
        }
    }
}
