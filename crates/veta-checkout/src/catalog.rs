//! # Product Catalog Seam
//!
//! The engine consumes catalog records as already-fetched data; the lookup
//! itself lives behind this trait, implemented by whatever backend the
//! deployment uses. The in-memory implementation exists for tests and demos.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::StoreError;
use veta_core::Product;

// =============================================================================
// Trait
// =============================================================================

/// Read-only product lookup.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Fetches a product by its id.
    async fn product_by_id(&self, id: &str) -> Result<Option<Product>, StoreError>;

    /// Fetches a product by its standard barcode (EAN-13 etc.).
    async fn product_by_barcode(&self, barcode: &str) -> Result<Option<Product>, StoreError>;

    /// Fetches a product by the 6-digit code embedded in scale barcodes.
    ///
    /// The code is compared as the literal left-padded string — `"000123"`
    /// and `"123"` are different codes.
    async fn product_by_scale_code(&self, code: &str) -> Result<Option<Product>, StoreError>;
}

// =============================================================================
// In-Memory Implementation
// =============================================================================

/// In-memory catalog for tests and local demos.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: HashMap<String, Product>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        InMemoryCatalog {
            products: products.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    pub fn insert(&mut self, product: Product) {
        self.products.insert(product.id.clone(), product);
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn product_by_id(&self, id: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.products.get(id).cloned())
    }

    async fn product_by_barcode(&self, barcode: &str) -> Result<Option<Product>, StoreError> {
        Ok(self
            .products
            .values()
            .find(|p| p.barcode.as_deref() == Some(barcode))
            .cloned())
    }

    async fn product_by_scale_code(&self, code: &str) -> Result<Option<Product>, StoreError> {
        Ok(self
            .products
            .values()
            .find(|p| p.scale_code.as_deref() == Some(code))
            .cloned())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use veta_core::{InventoryType, Money, SaleType};

    fn product(id: &str, scale_code: Option<&str>) -> Product {
        Product {
            id: id.to_string(),
            sku: format!("SKU-{}", id),
            barcode: Some(format!("779{}", id)),
            scale_code: scale_code.map(str::to_string),
            name: format!("Product {}", id),
            category_id: None,
            sale_type: SaleType::Weight,
            inventory_type: InventoryType::Untracked,
            unit_price: Money::from_bs(40),
            stock_units: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_scale_code_lookup_is_literal() {
        let catalog = InMemoryCatalog::with_products([product("p1", Some("000123"))]);

        let found = catalog.product_by_scale_code("000123").await.unwrap();
        assert_eq!(found.unwrap().id, "p1");

        // Leading zeros are significant
        let missed = catalog.product_by_scale_code("123").await.unwrap();
        assert!(missed.is_none());
    }

    #[tokio::test]
    async fn test_barcode_lookup() {
        let catalog = InMemoryCatalog::with_products([product("p1", None)]);
        let found = catalog.product_by_barcode("779p1").await.unwrap();
        assert_eq!(found.unwrap().id, "p1");
        assert!(catalog.product_by_barcode("nope").await.unwrap().is_none());
    }
}
