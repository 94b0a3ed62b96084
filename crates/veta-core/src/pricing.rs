//! # Pricing Calculator
//!
//! Pure functions over cart snapshots. Nothing here mutates; the cart calls
//! in for derived values and discount recomputations.
//!
//! ## The Rounding Points
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every currency aggregate rounds half-up to whole Bolivianos — at      │
//! │  EACH of these points independently, never once at the end:            │
//! │                                                                         │
//! │  line subtotal  = round(qty × unit_price)                              │
//! │  line total     = line subtotal − round(discount)                      │
//! │  cart subtotal  = Σ line subtotals          (already-rounded terms)    │
//! │  cart total     = max(0, cart subtotal                                 │
//! │                          − round(Σ line discounts)                     │
//! │                          − round(cart discount))                       │
//! │                                                                         │
//! │  A weight line of 1.253 kg at Bs 47.50/kg is Bs 60 — not 59.52, and   │
//! │  not whatever a float accumulator drifts to. The legacy receipts       │
//! │  round exactly like this and ours must agree to the Boliviano.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;

use crate::cart::{Cart, CartLine};
use crate::money::Money;

// =============================================================================
// Line-Level Totals
// =============================================================================

/// Line subtotal: `round(qty × unit_price)`, pre-discount.
pub fn line_subtotal(line: &CartLine) -> Money {
    line.unit_price.times(line.quantity).rounded()
}

/// Line total: `line_subtotal − round(discount)`.
///
/// Not clamped: a discount may legally equal the full subtotal, producing 0.
/// Display-side flooring is the UI's concern, never storage's.
pub fn line_total(line: &CartLine) -> Money {
    line_subtotal(line) - line.discount.rounded()
}

/// The post-discount price per unit actually being charged on a line.
///
/// Exact (unrounded) so quantity changes can recompute the discount without
/// accumulating drift.
pub fn effective_unit_price(line: &CartLine) -> Decimal {
    if line.quantity.is_zero() {
        return line.unit_price.amount();
    }
    (line_subtotal(line) - line.discount).amount() / line.quantity
}

// =============================================================================
// Cart-Level Totals
// =============================================================================

/// Sum of line subtotals (each already rounded).
pub fn cart_subtotal(cart: &Cart) -> Money {
    cart.lines.iter().map(line_subtotal).sum()
}

/// Sum of raw line discounts (2dp inputs; rounded where it feeds the total).
pub fn item_discounts_total(cart: &Cart) -> Money {
    cart.lines.iter().map(|l| l.discount).sum()
}

/// Grand total, clamped at zero regardless of discount inputs.
pub fn cart_total(cart: &Cart) -> Money {
    (cart_subtotal(cart) - item_discounts_total(cart).rounded() - cart.discount.rounded())
        .clamp_at_zero()
}

// =============================================================================
// Discount Recomputation
// =============================================================================

/// Discount equivalent of a manual unit-price override.
///
/// `round(qty × original) − round(qty × new)`, clamped ≥ 0. The line's frozen
/// unit price never changes; the override lives entirely in the discount.
pub fn discount_for_override(qty: Decimal, original: Money, new_price: Money) -> Money {
    (original.times(qty).rounded() - new_price.times(qty).rounded()).clamp_at_zero()
}

/// Discount for a quantity change that preserves the line's *effective*
/// (post-discount) unit price.
///
/// `effective = (round(old_qty × price) − old_discount) / old_qty`, then
/// `new_discount = round(new_qty × price) − round(new_qty × effective)`.
pub fn discount_for_quantity_change(line: &CartLine, new_qty: Decimal) -> Money {
    if line.discount.is_zero() {
        return Money::zero();
    }
    let effective = Money::new(effective_unit_price(line));
    (line.unit_price.times(new_qty).rounded() - effective.times(new_qty).rounded()).clamp_at_zero()
}

// =============================================================================
// Unit Tests
// =============================================================================
