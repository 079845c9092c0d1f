//! Cache types for catalog responses.

use crate::shopify::types::{CollectionConnection, CollectionProducts, Product, ProductConnection};

/// Cached value types. Carts are never cached.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(ProductConnection),
    Collection(Box<CollectionProducts>),
    Collections(CollectionConnection),
}
