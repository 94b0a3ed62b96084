//! # Money Module
//!
//! Provides the `Money` type for Boliviano amounts.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE ROUNDING POLICY                                                    │
//! │                                                                         │
//! │  Scale labels price by weight:  1.253 kg × Bs 47.50/kg = Bs 59.5175    │
//! │  The shop charges whole Bolivianos, so every aggregate the cashier     │
//! │  sees is rounded half-up to an integer — and rounded AT EACH POINT:    │
//! │                                                                         │
//! │    line subtotal  = round(qty × unit price)                            │
//! │    line total     = subtotal − round(discount)                         │
//! │    cart total     = max(0, Σ subtotals − round(Σ discounts) − ...)     │
//! │                                                                         │
//! │  Rounding once at the end produces DIFFERENT totals. Receipts printed  │
//! │  by the legacy system round at each point; ours must match them to    │
//! │  the Boliviano, so each rounding site is an explicit `.rounded()`.     │
//! │                                                                         │
//! │  Discount inputs accept 2 decimals (Bs 2.50 off), so storage keeps     │
//! │  full Decimal precision and rounding is a calculation step, not a      │
//! │  property of the representation.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use veta_core::money::Money;
//! use rust_decimal_macros::dec;
//!
//! let per_kg = Money::new(dec!(47.50));
//! let subtotal = per_kg.times(dec!(1.253)).rounded();
//! assert_eq!(subtotal, Money::from_bs(60)); // 59.5175 → 60
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in Bolivianos (Bs).
///
/// ## Design Decisions
/// - **Decimal (exact)**: weights carry 3 decimals and discounts 2; binary
///   floats cannot reproduce the documented rounding points deterministically
/// - **Signed**: intermediate discount math may dip negative before clamping
/// - **Single field tuple struct**: zero-cost abstraction over `Decimal`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS, Default,
)]
#[ts(export)]
pub struct Money(#[ts(as = "String")] Decimal);

impl Money {
    /// Creates a Money value from a whole number of Bolivianos.
    #[inline]
    pub fn from_bs(bs: i64) -> Self {
        Money(Decimal::from(bs))
    }

    /// Creates a Money value from an exact decimal amount.
    ///
    /// Used for 2-decimal discount inputs and batch prices; aggregate
    /// arithmetic still rounds through [`Money::rounded`].
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Returns the underlying decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Rounds half-up to a whole Boliviano.
    ///
    /// This is *the* rounding policy: round-half-up (midpoint away from zero)
    /// to zero decimal places, applied independently at every documented
    /// point — never once on an unrounded running total.
    ///
    /// ## Example
    /// ```rust
    /// use veta_core::money::Money;
    /// use rust_decimal_macros::dec;
    ///
    /// assert_eq!(Money::new(dec!(59.50)).rounded(), Money::from_bs(60));
    /// assert_eq!(Money::new(dec!(59.49)).rounded(), Money::from_bs(59));
    /// ```
    #[inline]
    pub fn rounded(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Multiplies by a quantity (integer units or decimal kilograms).
    ///
    /// The result is NOT rounded; callers round at the documented points.
    #[inline]
    pub fn times(&self, qty: Decimal) -> Money {
        Money(self.0 * qty)
    }

    /// Zero Bolivianos.
    #[inline]
    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Absolute difference between two amounts (for tolerance matching).
    #[inline]
    pub fn abs_diff(&self, other: Money) -> Decimal {
        (self.0 - other.0).abs()
    }

    /// Clamps negative amounts to zero. Used where the policy says a total
    /// can never go below zero (grand total, override-derived discounts).
    #[inline]
    pub fn clamp_at_zero(&self) -> Money {
        if self.0.is_sign_negative() {
            Money::zero()
        } else {
            *self
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// For debugging and logs; the frontend formats for display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bs {}", self.0.normalize())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_bs() {
        let money = Money::from_bs(75);
        assert_eq!(money.amount(), dec!(75));
        assert!(money.is_positive());
    }

    #[test]
    fn test_rounded_half_up() {
        assert_eq!(Money::new(dec!(59.50)).rounded(), Money::from_bs(60));
        assert_eq!(Money::new(dec!(59.4999)).rounded(), Money::from_bs(59));
        assert_eq!(Money::new(dec!(0.5)).rounded(), Money::from_bs(1));
        // Whole amounts are unchanged
        assert_eq!(Money::from_bs(120).rounded(), Money::from_bs(120));
    }

    #[test]
    fn test_times_keeps_precision_until_rounded() {
        let per_kg = Money::new(dec!(47.50));
        let raw = per_kg.times(dec!(1.253));
        assert_eq!(raw.amount(), dec!(59.51750));
        assert_eq!(raw.rounded(), Money::from_bs(60));
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_bs(100);
        let b = Money::new(dec!(12.50));

        assert_eq!((a + b).amount(), dec!(112.50));
        assert_eq!((a - b).amount(), dec!(87.50));

        let mut acc = Money::zero();
        acc += a;
        acc -= b;
        assert_eq!(acc.amount(), dec!(87.50));
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money::from_bs(10), Money::from_bs(20), Money::from_bs(30)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_bs(60));
    }

    #[test]
    fn test_clamp_at_zero() {
        assert_eq!((Money::from_bs(5) - Money::from_bs(8)).clamp_at_zero(), Money::zero());
        assert_eq!(Money::from_bs(5).clamp_at_zero(), Money::from_bs(5));
    }

    #[test]
    fn test_abs_diff() {
        let a = Money::new(dec!(120.00));
        let b = Money::new(dec!(120.009));
        assert_eq!(a.abs_diff(b), dec!(0.009));
        assert_eq!(b.abs_diff(a), dec!(0.009));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_bs(75)), "Bs 75");
        assert_eq!(format!("{}", Money::new(dec!(12.50))), "Bs 12.5");
    }

    /// Rounding at each point differs from rounding once at the end — this is
    /// the documented behavior the legacy receipts exhibit.
    #[test]
    fn test_round_at_each_point_differs_from_round_once() {
        let a = Money::new(dec!(10.4)); // rounds to 10
        let b = Money::new(dec!(10.4)); // rounds to 10
        let each_point = a.rounded() + b.rounded(); // 20
        let once = (a + b).rounded(); // 20.8 → 21
        assert_eq!(each_point, Money::from_bs(20));
        assert_eq!(once, Money::from_bs(21));
        assert_ne!(each_point, once);
    }
}
