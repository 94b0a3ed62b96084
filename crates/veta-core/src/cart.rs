//! # Cart Engine
//!
//! Owns the transaction draft: an ordered list of lines plus a cart-level
//! discount, with every mutation expressed as a method on the aggregate.
//!
//! ## Line Kinds and Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Cart Lines                                      │
//! │                                                                         │
//! │  LineSource::Catalog   unit- or weight-sold product from the catalog   │
//! │                        re-adding the same product merges quantities    │
//! │                                                                         │
//! │  LineSource::Batch     one registered vacuum-packed package            │
//! │                        quantity fixed at 1, never merged               │
//! │                                                                         │
//! │  LineSource::Phantom   a package scanned/keyed before it exists in     │
//! │                        inventory; settlement must create the batch     │
//! │                        record and back-fill its id                     │
//! │                                                                         │
//! │  State machine:                                                        │
//! │                                                                         │
//! │    Draft ──commit──► Committed ──register_batch──► BatchRegistered     │
//! │      ▲                   │                          (phantom only)     │
//! │      └──update_qty(0)────┘                                             │
//! │                                                                         │
//! │  Draft only exists while the operator is editing a quantity field;     │
//! │  a cart with Draft lines cannot settle.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing;
use crate::types::{InventoryType, Product, SaleType};
use crate::validation::{
    validate_batch_number, validate_cart_discount, validate_line_discount, validate_quantity,
};
use crate::{MAX_CART_LINES, MIN_WEIGHT_QUANTITY};

// =============================================================================
// Line Source
// =============================================================================

/// Where a line's goods come from. Tagged union instead of a bag of optional
/// fields: a line is exactly one of these, never a mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineSource {
    /// Plain catalog line (unit- or weight-sold).
    Catalog,

    /// A registered vacuum-packed package, held by this cart.
    Batch {
        batch_id: String,
        batch_number: String,
        /// Actual package weight in kg (3dp), for the receipt.
        #[ts(as = "String")]
        actual_weight: Decimal,
    },

    /// A package not yet registered in inventory. Settlement must create the
    /// batch record first and then back-fill the real id via
    /// [`Cart::register_batch`].
    Phantom {
        #[ts(as = "String")]
        actual_weight: Decimal,
    },
}

// =============================================================================
// Line State
// =============================================================================

/// Lifecycle state of a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LineState {
    /// Quantity is mid-edit (may transiently be 0). Not sellable.
    Draft,
    /// Quantity finalized; discount optional. Sellable.
    Committed,
    /// Phantom line whose batch record now exists in inventory.
    BatchRegistered,
}

// =============================================================================
// Cart Line
// =============================================================================

/// One row of the transaction.
///
/// Product data is snapshotted at add time: the cart keeps displaying
/// consistent values even if the catalog changes mid-sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Line identifier (UUID v4), stable across quantity/discount edits.
    pub id: String,

    /// Product ID (for settlement lookups).
    pub product_id: String,

    /// SKU at time of adding (frozen).
    pub sku: String,

    /// Product name at time of adding (frozen).
    pub name: String,

    /// How the product is priced.
    pub sale_type: SaleType,

    /// Frozen unit price: per item / per kg for catalog lines, the whole
    /// package price for batch and phantom lines. Manual price overrides are
    /// expressed as discount, never by mutating this field.
    pub unit_price: Money,

    /// Quantity: integer-valued for unit sale, kilograms (3dp) for weight
    /// sale, always exactly 1 for batch and phantom lines.
    #[ts(as = "String")]
    pub quantity: Decimal,

    /// Item-level discount in Bs (2dp input). Invariant: 0 ≤ discount ≤
    /// line subtotal.
    pub discount: Money,

    /// Where the goods come from.
    pub source: LineSource,

    /// Lifecycle state.
    pub state: LineState,

    /// When this line was added.
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    fn new(product: &Product, quantity: Decimal, unit_price: Money, source: LineSource) -> Self {
        CartLine {
            id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            sale_type: product.sale_type,
            unit_price,
            quantity,
            discount: Money::zero(),
            source,
            state: LineState::Committed,
            added_at: Utc::now(),
        }
    }

    /// Line subtotal under the rounding policy (pre-discount).
    #[inline]
    pub fn subtotal(&self) -> Money {
        pricing::line_subtotal(self)
    }

    /// Line total (subtotal − rounded discount).
    #[inline]
    pub fn total(&self) -> Money {
        pricing::line_total(self)
    }

    /// Whether this line is one physical package (batch or phantom).
    /// Package lines have quantity fixed at 1 and are never merged.
    pub fn is_package(&self) -> bool {
        !matches!(self.source, LineSource::Catalog)
    }

    /// The registered batch id, if this line holds one.
    pub fn batch_id(&self) -> Option<&str> {
        match &self.source {
            LineSource::Batch { batch_id, .. } => Some(batch_id),
            _ => None,
        }
    }

    /// The registered batch number, if this line holds one.
    pub fn batch_number(&self) -> Option<&str> {
        match &self.source {
            LineSource::Batch { batch_number, .. } => Some(batch_number),
            _ => None,
        }
    }

    /// Whether settlement must create a batch record for this line.
    pub fn needs_batch_creation(&self) -> bool {
        matches!(self.source, LineSource::Phantom { .. })
    }

    /// Package weight for batch/phantom lines.
    pub fn actual_weight(&self) -> Option<Decimal> {
        match &self.source {
            LineSource::Batch { actual_weight, .. } | LineSource::Phantom { actual_weight } => {
                Some(*actual_weight)
            }
            LineSource::Catalog => None,
        }
    }

    fn state_name(&self) -> String {
        format!("{:?}", self.state)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The transaction draft.
///
/// ## Invariants
/// - Plain lines are unique per product (adding again merges quantities)
/// - A batch id appears on at most one line
/// - Committed quantities are > 0 (Draft may transiently hold 0)
/// - 0 ≤ line discount ≤ line subtotal; 0 ≤ cart discount ≤ cart subtotal
/// - At most [`MAX_CART_LINES`] lines
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Lines, in the order the operator added them.
    pub lines: Vec<CartLine>,

    /// Cart-level discount, distinct from per-line discounts.
    pub discount: Money,

    /// When the cart was created/last cleared.
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            discount: Money::zero(),
            created_at: Utc::now(),
        }
    }

    // -------------------------------------------------------------------------
    // Add operations
    // -------------------------------------------------------------------------

    /// Adds a plain catalog line (unit- or weight-sold product).
    ///
    /// ## Behavior
    /// - Same product already present as a plain line: quantities merge
    ///   (per-package lines never merge)
    /// - Unit-sale, unit-inventory products are stock-gated against the units
    ///   already committed in this draft
    ///
    /// ## Returns
    /// The id of the affected line.
    pub fn add_product(&mut self, product: &Product, quantity: Decimal) -> CoreResult<String> {
        self.ensure_active(product)?;
        // Vacuum-packed goods enter per physical package, never as a plain
        // catalog line priced off the per-kg rate
        if product.is_vacuum_packed() {
            return Err(CoreError::BatchTrackingRequired {
                sku: product.sku.clone(),
            });
        }
        validate_quantity(product.sale_type, quantity)?;

        if product.sale_type == SaleType::Unit && product.inventory_type == InventoryType::Unit {
            self.check_unit_stock(product, quantity)?;
        }

        // Merge into an existing plain line of the same product
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product.id && !l.is_package())
        {
            let new_qty = line.quantity + quantity;
            validate_quantity(product.sale_type, new_qty)?;
            line.discount =
                pricing::discount_for_quantity_change(line, new_qty);
            line.quantity = new_qty;
            return Ok(line.id.clone());
        }

        self.ensure_capacity()?;
        let line = CartLine::new(product, quantity, product.unit_price, LineSource::Catalog);
        let id = line.id.clone();
        self.lines.push(line);
        Ok(id)
    }

    /// Adds a registered vacuum-packed batch as its own line.
    ///
    /// Quantity is fixed at 1: one package, one line. Availability (sold /
    /// reserved flags) is checked upstream by the reservation policy; here we
    /// only guard against the same physical package entering twice.
    pub fn add_batch(
        &mut self,
        product: &Product,
        batch: &crate::types::ProductBatch,
    ) -> CoreResult<String> {
        self.ensure_active(product)?;

        if self.batch_ids().iter().any(|id| *id == batch.id) {
            return Err(CoreError::BatchAlreadyInCart {
                batch_number: batch.batch_number.clone(),
            });
        }

        self.ensure_capacity()?;
        let line = CartLine::new(
            product,
            Decimal::ONE,
            batch.unit_price,
            LineSource::Batch {
                batch_id: batch.id.clone(),
                batch_number: batch.batch_number.clone(),
                actual_weight: batch.actual_weight,
            },
        );
        let id = line.id.clone();
        self.lines.push(line);
        Ok(id)
    }

    /// Adds a phantom line: a package with no inventory record yet.
    ///
    /// Weight and price must already be validated (> 0) by the reservation
    /// policy; the batch record is created at settlement and back-filled via
    /// [`Cart::register_batch`].
    pub fn add_phantom(
        &mut self,
        product: &Product,
        actual_weight: Decimal,
        package_price: Money,
    ) -> CoreResult<String> {
        self.ensure_active(product)?;
        self.ensure_capacity()?;

        let line = CartLine::new(
            product,
            Decimal::ONE,
            package_price,
            LineSource::Phantom { actual_weight },
        );
        let id = line.id.clone();
        self.lines.push(line);
        Ok(id)
    }

    // -------------------------------------------------------------------------
    // Update operations
    // -------------------------------------------------------------------------

    /// Changes a line's quantity.
    ///
    /// ## Behavior
    /// - Negative values are rejected outright
    /// - 0 is tolerated as a transient editing state: the line drops to
    ///   `Draft` and must be normalized via [`Cart::commit_line`] before the
    ///   cart can settle
    /// - On a discounted line the discount is recomputed so the *effective*
    ///   (post-discount) unit price is preserved
    /// - Package lines (batch/phantom) have quantity fixed at 1
    pub fn update_quantity(&mut self, line_id: &str, quantity: Decimal) -> CoreResult<()> {
        if quantity.is_sign_negative() {
            return Err(CoreError::Validation(
                crate::error::ValidationError::MustNotBeNegative {
                    field: "quantity".to_string(),
                },
            ));
        }

        let line = self.find_line_mut(line_id)?;
        if line.is_package() {
            return Err(CoreError::InvalidLineState {
                line_id: line_id.to_string(),
                state: "a single package (quantity fixed at 1)".to_string(),
            });
        }

        if quantity.is_zero() {
            // Transient editing state; commit_line normalizes it.
            line.discount = Money::zero();
            line.quantity = Decimal::ZERO;
            line.state = LineState::Draft;
            return Ok(());
        }

        validate_quantity(line.sale_type, quantity)?;
        line.discount = pricing::discount_for_quantity_change(line, quantity);
        line.quantity = quantity;
        line.state = LineState::Committed;
        Ok(())
    }

    /// Finalizes a Draft line so it becomes sellable.
    ///
    /// A quantity of 0 is normalized to the minimum sellable quantity:
    /// 1 for unit sale, 0.01 kg for weight sale.
    pub fn commit_line(&mut self, line_id: &str) -> CoreResult<()> {
        let line = self.find_line_mut(line_id)?;
        if line.quantity.is_zero() {
            line.quantity = match line.sale_type {
                SaleType::Unit => Decimal::ONE,
                SaleType::Weight => MIN_WEIGHT_QUANTITY,
            };
        }
        if line.state == LineState::Draft {
            line.state = LineState::Committed;
        }
        Ok(())
    }

    /// Removes a line.
    pub fn remove_line(&mut self, line_id: &str) -> CoreResult<()> {
        let idx = self.line_index(line_id)?;
        self.lines.remove(idx);
        Ok(())
    }

    /// Sets a line's discount amount.
    ///
    /// Fails with the valid bound if the amount is negative or exceeds the
    /// line subtotal. Setting the current discount again is a no-op.
    pub fn set_line_discount(&mut self, line_id: &str, amount: Money) -> CoreResult<()> {
        let line = self.find_line(line_id)?;
        validate_line_discount(amount, line.subtotal())?;
        self.find_line_mut(line_id)?.discount = amount;
        Ok(())
    }

    /// Overrides a line's effective unit price.
    ///
    /// The frozen `unit_price` never changes; the override is expressed as a
    /// discount: `round(qty × original) − round(qty × new)`, clamped at 0
    /// (an override above the original price grants no negative discount).
    pub fn set_line_unit_price(&mut self, line_id: &str, new_price: Money) -> CoreResult<()> {
        if new_price.is_negative() {
            return Err(CoreError::Validation(
                crate::error::ValidationError::MustNotBeNegative {
                    field: "unit price".to_string(),
                },
            ));
        }
        let line = self.find_line_mut(line_id)?;
        line.discount = pricing::discount_for_override(line.quantity, line.unit_price, new_price);
        Ok(())
    }

    /// Sets the cart-level discount.
    pub fn set_cart_discount(&mut self, amount: Money) -> CoreResult<()> {
        validate_cart_discount(amount, pricing::cart_subtotal(self))?;
        self.discount = amount;
        Ok(())
    }

    /// Back-fills the real batch id onto a phantom line once settlement has
    /// created the inventory record.
    ///
    /// Weight and package price are preserved exactly; only the source and
    /// state change (`Phantom/Committed → Batch/BatchRegistered`).
    pub fn register_batch(
        &mut self,
        line_id: &str,
        batch_id: &str,
        batch_number: &str,
    ) -> CoreResult<()> {
        validate_batch_number(batch_number)?;
        let line = self.find_line_mut(line_id)?;
        match line.source {
            LineSource::Phantom { actual_weight } if line.state == LineState::Committed => {
                line.source = LineSource::Batch {
                    batch_id: batch_id.to_string(),
                    batch_number: batch_number.to_string(),
                    actual_weight,
                };
                line.state = LineState::BatchRegistered;
                Ok(())
            }
            _ => Err(CoreError::InvalidLineState {
                line_id: line_id.to_string(),
                state: line.state_name(),
            }),
        }
    }

    /// Clears all lines and the cart discount.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.discount = Money::zero();
        self.created_at = Utc::now();
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Batch ids already held by this cart (feeds the matcher's exclusion).
    pub fn batch_ids(&self) -> Vec<String> {
        self.lines
            .iter()
            .filter_map(|l| l.batch_id().map(str::to_string))
            .collect()
    }

    /// Units of a product committed on plain lines of this draft.
    ///
    /// This is the running reservation: persistent stock is untouched until
    /// settlement, but the draft must not oversell against itself.
    pub fn committed_units(&self, product_id: &str) -> i64 {
        self.lines
            .iter()
            .filter(|l| l.product_id == product_id && !l.is_package())
            .map(Self::unit_qty)
            .sum()
    }

    /// The cart can settle only when every line is finalized.
    pub fn ensure_sellable(&self) -> CoreResult<()> {
        for line in &self.lines {
            if line.state == LineState::Draft || !line.quantity.is_sign_positive()
                || line.quantity.is_zero()
            {
                return Err(CoreError::InvalidLineState {
                    line_id: line.id.clone(),
                    state: line.state_name(),
                });
            }
        }
        Ok(())
    }

    pub fn find_line(&self, line_id: &str) -> CoreResult<&CartLine> {
        self.lines
            .iter()
            .find(|l| l.id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn find_line_mut(&mut self, line_id: &str) -> CoreResult<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|l| l.id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))
    }

    fn line_index(&self, line_id: &str) -> CoreResult<usize> {
        self.lines
            .iter()
            .position(|l| l.id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))
    }

    fn ensure_active(&self, product: &Product) -> CoreResult<()> {
        if !product.is_active {
            return Err(CoreError::ProductInactive {
                sku: product.sku.clone(),
            });
        }
        Ok(())
    }

    fn ensure_capacity(&self) -> CoreResult<()> {
        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }
        Ok(())
    }

    fn unit_qty(line: &CartLine) -> i64 {
        line.quantity.to_i64().unwrap_or(0)
    }

    fn check_unit_stock(&self, product: &Product, requested: Decimal) -> CoreResult<()> {
        let committed = self.committed_units(&product.id);
        let available = product.available_units(committed);
        let requested_units = requested.to_i64().unwrap_or(0);
        if available < requested_units {
            return Err(CoreError::InsufficientStock {
                sku: product.sku.clone(),
                available: available.max(0),
                requested: requested_units,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Cart Totals
// =============================================================================

/// Aggregate totals for API/UI consumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub line_count: usize,
    pub subtotal: Money,
    pub item_discounts_total: Money,
    pub cart_discount: Money,
    pub total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            line_count: cart.line_count(),
            subtotal: pricing::cart_subtotal(cart),
            item_discounts_total: pricing::item_discounts_total(cart),
            cart_discount: cart.discount,
            total: pricing::cart_total(cart),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
