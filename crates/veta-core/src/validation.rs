//! # Validation Module
//!
//! Input validation for operator-entered values.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Terminal UI                                                  │
//! │  ├── Basic format checks (empty, keypad range)                         │
//! │  └── Immediate cashier feedback                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │  ├── Quantity shape per sale type (integer vs 3dp weight)              │
//! │  ├── Manual weight/price entry (> 0)                                   │
//! │  └── Discount bounds (the valid bound travels in the error)            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Settlement collaborator (authoritative stock & batches)      │
//! │                                                                         │
//! │  Every rejection leaves the cart untouched; the operator corrects      │
//! │  and resubmits.                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;
use crate::types::SaleType;
use crate::{MAX_UNIT_QUANTITY, MIN_WEIGHT_QUANTITY};

// =============================================================================
// Quantity Validators
// =============================================================================

/// Validates a committed quantity for a product's sale type.
///
/// ## Rules
/// - Unit sale: whole number, 1 ..= [`MAX_UNIT_QUANTITY`]
/// - Weight sale: at least [`MIN_WEIGHT_QUANTITY`] kg, at most 3 decimals
///   (the scale resolves to the gram)
///
/// Zero is rejected here: transient zero lives only in the cart's Draft
/// state, never in a committed quantity.
pub fn validate_quantity(sale_type: SaleType, qty: Decimal) -> ValidationResult<()> {
    if qty.is_sign_negative() || qty.is_zero() {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    match sale_type {
        SaleType::Unit => {
            if qty != qty.trunc() {
                return Err(ValidationError::NotAnInteger {
                    field: "quantity".to_string(),
                });
            }
            if qty > Decimal::from(MAX_UNIT_QUANTITY) {
                return Err(ValidationError::AboveMaximum {
                    field: "quantity".to_string(),
                    max: MAX_UNIT_QUANTITY,
                });
            }
        }
        SaleType::Weight => {
            if qty < MIN_WEIGHT_QUANTITY {
                return Err(ValidationError::BelowMinimum {
                    field: "quantity".to_string(),
                    min: MIN_WEIGHT_QUANTITY,
                });
            }
            if has_more_decimals_than(qty, 3) {
                return Err(ValidationError::TooManyDecimals {
                    field: "quantity".to_string(),
                    max_dp: 3,
                });
            }
        }
    }

    Ok(())
}

// =============================================================================
// Manual Entry Validators
// =============================================================================

/// Validates a manually keyed weight + package price for a vacuum-packed
/// product (the label would not scan).
///
/// ## Rules
/// - Weight > 0 kg, at most 3 decimals
/// - Price > 0 Bs
pub fn validate_manual_entry(weight_kg: Decimal, package_price: Money) -> ValidationResult<()> {
    if weight_kg.is_sign_negative() || weight_kg.is_zero() {
        return Err(ValidationError::MustBePositive {
            field: "weight".to_string(),
        });
    }
    if has_more_decimals_than(weight_kg, 3) {
        return Err(ValidationError::TooManyDecimals {
            field: "weight".to_string(),
            max_dp: 3,
        });
    }
    if !package_price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Discount Validators
// =============================================================================

/// Validates an item-level discount against the line subtotal.
///
/// The valid bound travels in the error so the UI can tell the operator the
/// maximum, not just "invalid".
pub fn validate_line_discount(amount: Money, line_subtotal: Money) -> ValidationResult<()> {
    validate_discount("discount", amount, line_subtotal)
}

/// Validates the cart-level discount against the cart subtotal.
pub fn validate_cart_discount(amount: Money, cart_subtotal: Money) -> ValidationResult<()> {
    validate_discount("cart discount", amount, cart_subtotal)
}

fn validate_discount(field: &str, amount: Money, max: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    if has_more_decimals_than(amount.amount(), 2) {
        return Err(ValidationError::TooManyDecimals {
            field: field.to_string(),
            max_dp: 2,
        });
    }
    if amount > max {
        return Err(ValidationError::ExceedsBound {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Batch Validators
// =============================================================================

/// Validates a batch number for phantom-batch creation at settlement.
pub fn validate_batch_number(batch_number: &str) -> ValidationResult<()> {
    let batch_number = batch_number.trim();

    if batch_number.is_empty() {
        return Err(ValidationError::Required {
            field: "batch_number".to_string(),
        });
    }
    if !batch_number
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "batch_number".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }
    Ok(())
}

fn has_more_decimals_than(value: Decimal, max_dp: u32) -> bool {
    value.normalize().scale() > max_dp
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_unit_quantity() {
        assert!(validate_quantity(SaleType::Unit, dec!(1)).is_ok());
        assert!(validate_quantity(SaleType::Unit, dec!(999)).is_ok());

        assert!(validate_quantity(SaleType::Unit, dec!(0)).is_err());
        assert!(validate_quantity(SaleType::Unit, dec!(-1)).is_err());
        assert!(validate_quantity(SaleType::Unit, dec!(1.5)).is_err());
        assert!(validate_quantity(SaleType::Unit, dec!(1000)).is_err());
    }

    #[test]
    fn test_weight_quantity() {
        assert!(validate_quantity(SaleType::Weight, dec!(0.01)).is_ok());
        assert!(validate_quantity(SaleType::Weight, dec!(1.253)).is_ok());
        // Trailing zeros are not extra precision
        assert!(validate_quantity(SaleType::Weight, dec!(2.500)).is_ok());

        assert!(validate_quantity(SaleType::Weight, dec!(0)).is_err());
        assert!(validate_quantity(SaleType::Weight, dec!(0.009)).is_err());
        assert!(validate_quantity(SaleType::Weight, dec!(1.2534)).is_err());
    }

    #[test]
    fn test_manual_entry() {
        assert!(validate_manual_entry(dec!(1.850), Money::from_bs(92)).is_ok());

        assert!(validate_manual_entry(dec!(0), Money::from_bs(92)).is_err());
        assert!(validate_manual_entry(dec!(-1.5), Money::from_bs(92)).is_err());
        assert!(validate_manual_entry(dec!(1.850), Money::zero()).is_err());
        assert!(validate_manual_entry(dec!(1.850), Money::from_bs(-5)).is_err());
        assert!(validate_manual_entry(dec!(1.8501), Money::from_bs(92)).is_err());
    }

    #[test]
    fn test_discount_bounds() {
        let subtotal = Money::from_bs(50);
        assert!(validate_line_discount(Money::zero(), subtotal).is_ok());
        assert!(validate_line_discount(Money::new(dec!(2.50)), subtotal).is_ok());
        assert!(validate_line_discount(Money::from_bs(50), subtotal).is_ok());

        assert!(validate_line_discount(Money::from_bs(-1), subtotal).is_err());
        assert!(validate_line_discount(Money::from_bs(51), subtotal).is_err());
        // Discount inputs accept at most 2 decimals
        assert!(validate_line_discount(Money::new(dec!(2.505)), subtotal).is_err());
    }

    #[test]
    fn test_discount_error_carries_bound() {
        let err = validate_cart_discount(Money::from_bs(120), Money::from_bs(100)).unwrap_err();
        match err {
            ValidationError::ExceedsBound { max, .. } => assert_eq!(max, Money::from_bs(100)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_batch_number() {
        assert!(validate_batch_number("L-0042").is_ok());
        assert!(validate_batch_number("MANUAL_20250301").is_ok());

        assert!(validate_batch_number("").is_err());
        assert!(validate_batch_number("   ").is_err());
        assert!(validate_batch_number("L 0042").is_err());
    }
}
