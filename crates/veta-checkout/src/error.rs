//! # Checkout Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Veta POS                               │
//! │                                                                         │
//! │  veta-core CoreError ──────────────┐                                    │
//! │  (cart rules, validation)          │                                    │
//! │                                    ▼                                    │
//! │  StoreError ───────────────► CheckoutError ───► operator message        │
//! │  (collaborator failures)           ▲                                    │
//! │                                    │                                    │
//! │  settlement-specific ──────────────┘                                    │
//! │  (conflicts, aborted phantom creation, bad tender)                     │
//! │                                                                         │
//! │  Recoverable: operator corrects and retries (most variants).          │
//! │  Fatal to the attempt: BatchCreationFailed — the whole settlement      │
//! │  aborts; no partial sale with a dangling phantom reference persists.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use veta_core::CoreError;

// =============================================================================
// Store Error
// =============================================================================

/// Failures reported by collaborator implementations (catalog, batch store,
/// sale recorder). The engine never sees transport details, only these.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity does not exist on the collaborator's side.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation lost a race (batch sold/reserved elsewhere, etc.).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Collaborator unreachable or rejected the call.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// Checkout Error
// =============================================================================

/// Errors surfaced by sessions and settlement.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Scanned / selected product cannot be found in the catalog.
    /// Recoverable: rescan or search manually.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Settlement was requested on an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cash tendered is below the cart total.
    #[error("Insufficient tender: total {total}, tendered {tendered}")]
    InsufficientTender {
        total: veta_core::Money,
        tendered: veta_core::Money,
    },

    /// A phantom line's batch record could not be created.
    ///
    /// FATAL to the settlement attempt: the whole settlement aborts and the
    /// operator retries manually. Never silently retried here.
    #[error("Batch creation failed for line {line_id}: {reason}")]
    BatchCreationFailed { line_id: String, reason: String },

    /// A matched batch was sold or reserved by another terminal between
    /// matching and settlement. The line must be re-resolved (rescan or
    /// reselect) — never silently substituted with another batch.
    #[error("Batch {batch_id} on line {line_id} was taken by another transaction")]
    ReservationConflict { line_id: String, batch_id: String },

    /// The sale record could not be persisted.
    #[error("Sale recording failed: {0}")]
    RecordingFailed(String),

    /// Transaction engine rule violation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Collaborator failure outside the settlement-specific cases above.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience type alias for Results with CheckoutError.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

// =============================================================================
// Unit Tests
// =============================================================================
