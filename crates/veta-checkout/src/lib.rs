//! # Veta Checkout
//!
//! Async checkout layer on top of the pure `veta-core` engine: sessions,
//! collaborator seams, and settlement.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        veta-checkout                                    │
//! │                                                                         │
//! │  CartSession (session) ── one open transaction per register             │
//! │      │                                                                  │
//! │      ├── scan / manual entry ──► veta-core reservation + cart           │
//! │      │                                                                  │
//! │      ├── ProductCatalog (catalog) ── product lookups                    │
//! │      ├── BatchStore (inventory) ──── batch list / create / mark_sold    │
//! │      └── SaleRecorder (settlement) ─ persisted sale records             │
//! │                                                                         │
//! │  settle() ── phantom registration, batch claiming, sale recording       │
//! │                                                                         │
//! │  Collaborators are trait seams; in-memory implementations back tests    │
//! │  and local demos. Transports live behind the seams, not here.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod error;
pub mod inventory;
pub mod session;
pub mod settlement;

pub use catalog::{InMemoryCatalog, ProductCatalog};
pub use error::{CheckoutError, CheckoutResult, StoreError};
pub use inventory::{BatchStore, InMemoryBatchStore, NewBatch};
pub use session::{CartSession, CartView, ScanOutcome};
pub use settlement::{
    settle, InMemorySaleLog, PaymentMethod, SaleLine, SaleRecord, SaleRecorder, Tender,
};
