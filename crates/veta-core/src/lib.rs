//! # veta-core: Pure Transaction Engine for Veta POS
//!
//! This crate is the **heart** of Veta POS, a point of sale for a butcher
//! shop. It contains the transaction logic as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Veta POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   Terminal UI (excluded)                        │   │
//! │  │    Scan ──► Cart display ──► Discounts ──► Tender ──► Receipt   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                veta-checkout (collaborator seams)               │   │
//! │  │    CartSession, ProductCatalog, BatchStore, settlement          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ veta-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐  │   │
//! │  │  │ barcode │ │  batch  │ │ pricing │ │  cart   │ │reservation│ │   │
//! │  │  │ decoder │ │ matcher │ │ rounding│ │ engine  │ │  policy  │  │   │
//! │  │  └─────────┘ └─────────┘ └─────────┘ └─────────┘ └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, ProductBatch)
//! - [`money`] - Money type with the whole-Boliviano rounding policy
//! - [`barcode`] - 18-digit scale barcode decoder
//! - [`batch`] - Tolerance matching and FIFO selection of packed batches
//! - [`pricing`] - Line and cart totals, discount recomputation
//! - [`cart`] - The transaction draft and all its mutations
//! - [`reservation`] - Consume / create-phantom / reject decisions
//! - [`validation`] - Operator-input validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Exact Decimals**: Weights and money use `rust_decimal`, never floats
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use veta_core::barcode::decode_scale_barcode;
//! use veta_core::money::Money;
//! use rust_decimal_macros::dec;
//!
//! // Label printed by the scale: 1.500 kg of product 000123 for Bs 75
//! let reading = decode_scale_barcode("000012301500000750").unwrap();
//! assert_eq!(reading.product_code, "000123");
//! assert_eq!(reading.weight_kg, dec!(1.500));
//! assert_eq!(reading.total_price, Money::from_bs(75));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod barcode;
pub mod batch;
pub mod cart;
pub mod error;
pub mod money;
pub mod pricing;
pub mod reservation;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use veta_core::Money` instead of
// `use veta_core::money::Money`

pub use barcode::{decode_scale_barcode, ScaleReading};
pub use cart::{Cart, CartLine, CartTotals, LineSource, LineState};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use reservation::{ReservationRequest, Resolution};
pub use types::{InventoryType, Product, ProductBatch, SaleType};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Length of a scale barcode: flag(1) + product(6) + grams(5) + Bs(5) + check(1).
pub const SCALE_BARCODE_LEN: usize = 18;

/// Weight tolerance for batch matching, in kilograms. STRICT: a difference of
/// exactly 0.001 kg is out of tolerance.
///
/// ## Business Reason
/// The scale resolves to the gram; a matching package re-weighed on the
/// counter scale may drift by fractions of a gram, never a full gram.
pub const WEIGHT_TOLERANCE_KG: Decimal = dec!(0.001);

/// Price tolerance for batch matching, in Bolivianos. STRICT, like the
/// weight tolerance.
pub const PRICE_TOLERANCE_BS: Decimal = dec!(0.01);

/// Minimum sellable quantity for weight-sold products, in kilograms.
/// Zero-quantity lines exist only transiently while the operator edits.
pub const MIN_WEIGHT_QUANTITY: Decimal = dec!(0.01);

/// Maximum lines allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and keeps receipts printable on one roll.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a unit-sold item on one line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_UNIT_QUANTITY: i64 = 999;
