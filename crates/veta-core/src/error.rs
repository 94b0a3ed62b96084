//! # Error Types
//!
//! Domain-specific error types for veta-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  veta-core errors (this file)                                          │
//! │  ├── CoreError        - Cart / reservation rule violations             │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  veta-checkout errors (separate crate)                                 │
//! │  └── CheckoutError    - Settlement / collaborator failures             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → operator message  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, batch number, valid bound)
//! 3. Errors are enum variants, never String
//! 4. All of these are recoverable at the terminal: the cart is left
//!    unchanged and the operator corrects and resubmits

use rust_decimal::Decimal;
use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Transaction engine errors.
///
/// These represent business rule violations. None of them mutate the cart;
/// the failed operation simply did not happen.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product exists but is soft-deleted / flagged inactive.
    #[error("Product {sku} is not available for sale")]
    ProductInactive { sku: String },

    /// Insufficient stock to add a unit-tracked product.
    ///
    /// `available` already discounts units committed earlier in this draft,
    /// so the operator sees what can actually still be added.
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Cart line cannot be found.
    #[error("Line not found in cart: {0}")]
    LineNotFound(String),

    /// A package operation was requested for a product whose inventory is
    /// not tracked as vacuum-packed batches.
    #[error("Product {sku} is not batch-tracked")]
    NotBatchTracked { sku: String },

    /// A plain catalog add was attempted for a vacuum-packed product. Those
    /// goods enter the cart per physical package: scan the scale label or
    /// key weight and price.
    #[error("Product {sku} is sold as vacuum-packed batches; scan the label or enter weight and price")]
    BatchTrackingRequired { sku: String },

    /// The same physical package cannot be added twice.
    #[error("Batch {batch_number} is already in the cart")]
    BatchAlreadyInCart { batch_number: String },

    /// Operation is not valid for the line's current state
    /// (e.g., registering a batch on a non-phantom line).
    #[error("Line {line_id} is {state}, cannot perform operation")]
    InvalidLineState { line_id: String, state: String },

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when operator input doesn't meet requirements, before any
/// business logic runs. Bound-carrying variants exist so the UI can tell the
/// operator the valid range, not just "invalid".
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be strictly positive (manual weight/price entry, quantity).
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Amount must not be negative (discounts).
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Amount exceeds its valid upper bound (discount > subtotal).
    #[error("{field} must not exceed {max}")]
    ExceedsBound { field: String, max: Money },

    /// Count exceeds its valid upper bound (quantity cap).
    #[error("{field} must be at most {max}")]
    AboveMaximum { field: String, max: i64 },

    /// Quantity for a unit-sold product must be a whole number.
    #[error("{field} must be a whole number for unit-sold products")]
    NotAnInteger { field: String },

    /// Value carries more decimal places than the field allows.
    #[error("{field} allows at most {max_dp} decimal places")]
    TooManyDecimals { field: String, max_dp: u32 },

    /// Value is below the field's minimum.
    #[error("{field} must be at least {min}")]
    BelowMinimum { field: String, min: Decimal },

    /// Invalid format (e.g., malformed batch number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================
