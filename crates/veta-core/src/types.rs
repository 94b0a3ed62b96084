//! # Domain Types
//!
//! Catalog and inventory records consumed by the transaction engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐       ┌─────────────────┐                         │
//! │  │    Product      │       │  ProductBatch   │                         │
//! │  │  ─────────────  │       │  ─────────────  │                         │
//! │  │  id (UUID)      │ 1   n │  id (UUID)      │                         │
//! │  │  sku (business) │◄──────┤  batch_number   │                         │
//! │  │  sale_type      │       │  actual_weight  │  one physical           │
//! │  │  inventory_type │       │  unit_price     │  vacuum-packed          │
//! │  │  unit_price     │       │  packed_at      │  package                │
//! │  │  stock_units    │       │  is_sold        │                         │
//! │  └─────────────────┘       │  is_reserved    │                         │
//! │                            └─────────────────┘                         │
//! │                                                                         │
//! │  SaleType:      Unit (per item)  │ Weight (per kilogram)               │
//! │  InventoryType: Unit (stock n)   │ VacuumPacked (batches) │ Untracked  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both records are owned by external collaborators (catalog / inventory);
//! the engine only reads them and marks consumption intent on the cart.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Sale Type
// =============================================================================

/// How a product is priced at the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleType {
    /// Priced per discrete item (e.g., a jar of spice mix). Integer quantity.
    Unit,
    /// Priced per kilogram (e.g., fresh cuts). Decimal quantity.
    Weight,
}

// =============================================================================
// Inventory Type
// =============================================================================

/// How inventory for a product is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InventoryType {
    /// Tracked as a discrete stock count.
    Unit,
    /// Tracked as individually weighed and priced vacuum-packed batches.
    VacuumPacked,
    /// Not tracked (made to order, always sellable).
    Untracked,
}

// =============================================================================
// Product
// =============================================================================

/// A catalog entry. Immutable during a transaction.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Standard catalog barcode (EAN-13 etc.), if any. Scale barcodes are
    /// decoded separately and reference `scale_code` instead.
    pub barcode: Option<String>,

    /// 6-digit product code printed inside scale barcodes. Kept as a string:
    /// leading zeros are significant (`"000123"` != `"123"`).
    pub scale_code: Option<String>,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Category reference.
    pub category_id: Option<String>,

    /// How the product is priced.
    pub sale_type: SaleType,

    /// How inventory is tracked.
    pub inventory_type: InventoryType,

    /// Base unit price: per item for `SaleType::Unit`, per kilogram for
    /// `SaleType::Weight`.
    pub unit_price: Money,

    /// Current stock count for `InventoryType::Unit` products.
    pub stock_units: Option<i64>,

    /// Whether product is active (soft delete).
    pub is_active: bool,
}

impl Product {
    /// Stock available for unit-tracked products, counting units already
    /// committed in the current draft as unavailable.
    ///
    /// Persistent stock is only decremented at settlement; the draft holds a
    /// running reservation so two lines of the same product cannot oversell.
    pub fn available_units(&self, committed_in_cart: i64) -> i64 {
        self.stock_units.unwrap_or(0) - committed_in_cart
    }

    /// Whether this product is sold as pre-weighed vacuum-packed batches.
    #[inline]
    pub fn is_vacuum_packed(&self) -> bool {
        self.inventory_type == InventoryType::VacuumPacked
    }
}

// =============================================================================
// Product Batch
// =============================================================================

/// One physical pre-weighed, pre-priced vacuum-packed package.
///
/// `unit_price` is the price of the WHOLE package in Bs, not per kilogram —
/// the scale computes it at packing time and prints it on the label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductBatch {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Product this batch belongs to.
    pub product_id: String,

    /// Human-readable batch number printed on the label.
    pub batch_number: String,

    /// Actual weight in kilograms, 3-decimal precision.
    #[ts(as = "String")]
    pub actual_weight: Decimal,

    /// Price for the whole package in Bs.
    pub unit_price: Money,

    /// When the package was weighed and sealed. Drives FIFO selection.
    #[ts(as = "String")]
    pub packed_at: DateTime<Utc>,

    /// Already sold in a completed transaction.
    pub is_sold: bool,

    /// Held by another in-flight cart. The reservation lock is server-side;
    /// this flag is a snapshot supplied by the inventory collaborator.
    pub is_reserved: bool,
}

impl ProductBatch {
    /// A batch can only be matched while neither sold nor reserved.
    #[inline]
    pub fn is_available(&self) -> bool {
        !self.is_sold && !self.is_reserved
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn unit_product(stock: i64) -> Product {
        Product {
            id: "p-1".to_string(),
            sku: "CHORIZO-6".to_string(),
            barcode: Some("7791234567890".to_string()),
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

    #[test]
    fn test_available_units_subtracts_cart_commitment() {
        let product = unit_product(5);
        assert_eq!(product.available_units(0), 5);
        assert_eq!(product.available_units(3), 2);
        assert_eq!(product.available_units(5), 0);
    }

    #[test]
    fn test_available_units_without_stock_field() {
        let mut product = unit_product(0);
        product.stock_units = None;
        assert_eq!(product.available_units(0), 0);
    }

    #[test]
    fn test_batch_availability() {
        let batch = ProductBatch {
            id: "b-1".to_string(),
            product_id: "p-1".to_string(),
            batch_number: "L-0042".to_string(),
            actual_weight: dec!(2.500),
            unit_price: Money::from_bs(120),
            packed_at: Utc::now(),
            is_sold: false,
            is_reserved: false,
        };
        assert!(batch.is_available());

        let sold = ProductBatch { is_sold: true, ..batch.clone() };
        assert!(!sold.is_available());

        let reserved = ProductBatch { is_reserved: true, ..batch };
        assert!(!reserved.is_available());
    }
}
