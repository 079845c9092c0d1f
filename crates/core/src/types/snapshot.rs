//! Minimal, durable projections persisted to local storage.
//!
//! Snapshots hold only what is needed to recreate state without a network
//! round trip. The full Shopify cart is never persisted: it is large and goes
//! stale immediately.

use serde::{Deserialize, Serialize};

use super::id::VariantId;

/// One re-creatable cart line: which variant, how many.
///
/// Stored as `{"variantId": "...", "quantity": n}` so snapshots written by
/// earlier app versions keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineSnapshot {
    /// Merchandise (product variant) GID.
    pub variant_id: VariantId,
    /// Quantity of the variant.
    pub quantity: i64,
}

impl CartLineSnapshot {
    /// Create a snapshot line.
    #[must_use]
    pub fn new(variant_id: impl Into<VariantId>, quantity: i64) -> Self {
        Self {
            variant_id: variant_id.into(),
            quantity,
        }
    }
}

/// Display data captured when a product is favorited.
///
/// Lets favorites render without fetching the product again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteSnapshot {
    /// Product GID.
    pub id: String,
    /// Product handle for navigation.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Featured image URL.
    pub image_url: Option<String>,
    /// Decimal price amount (e.g., "52.00").
    pub price: String,
    /// ISO 4217 currency code.
    pub currency_code: String,
    /// Product vendor.
    pub vendor: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_line_snapshot_wire_format() {
        let line = CartLineSnapshot::new("gid://shopify/ProductVariant/1", 2);
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"variantId": "gid://shopify/ProductVariant/1", "quantity": 2})
        );
    }

    #[test]
    fn test_favorite_snapshot_reads_camel_case() {
        let raw = r#"{
            "id": "gid://shopify/Product/9",
            "handle": "silk-scarf",
            "title": "Silk Scarf",
            "imageUrl": null,
            "price": "52.00",
            "currencyCode": "USD",
            "vendor": "Ashley Sifford"
        }"#;
        let fav: FavoriteSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(fav.handle, "silk-scarf");
        assert!(fav.image_url.is_none());
        assert_eq!(fav.currency_code, "USD");
    }
}
